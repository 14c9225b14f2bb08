use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/today", get(handlers::get_today))
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/api/projects/:id", delete(handlers::delete_project))
        .route("/api/projects/:id/increment", post(handlers::increment))
        .route("/api/projects/:id/reset", post(handlers::reset))
        .route("/api/projects/:id/rename", post(handlers::rename))
        .route("/api/projects/:id/select", post(handlers::select))
        .route(
            "/api/projects/:id/logs/:date",
            put(handlers::upsert_log).delete(handlers::delete_log_entry),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/stats/start", put(handlers::set_stats_start))
        .route("/api/undo", post(handlers::undo))
        .route("/api/redo", post(handlers::redo))
        .route("/api/factory-reset", post(handlers::factory_reset))
        .with_state(state)
}
