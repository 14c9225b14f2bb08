use crate::errors::AppError;
use crate::models::{
    DeleteResponse, LogValueRequest, NameRequest, Project, ProjectView, StatsQuery,
    StatsResponse, StatsStartRequest, TodayResponse, day_key, parse_day,
};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::store::ProjectStore;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use chrono::NaiveDate;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let store = state.store.lock().await;
    Html(render_index(&to_today(&store)))
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    let store = state.store.lock().await;
    Json(to_today(&store))
}

pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectView>> {
    let store = state.store.lock().await;
    let views = store
        .all_by_recency()
        .into_iter()
        .map(|project| to_view(&store, project))
        .collect();
    Json(views)
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<NameRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    let mut store = state.store.lock().await;
    store
        .create(&payload.name)
        .ok_or_else(|| AppError::bad_request("name must not be empty"))?;
    Ok(Json(to_today(&store)))
}

pub async fn increment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodayResponse>, AppError> {
    apply(&state, &id, |store| store.increment(&id)).await
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodayResponse>, AppError> {
    apply(&state, &id, |store| store.reset(&id)).await
}

pub async fn select(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodayResponse>, AppError> {
    apply(&state, &id, |store| store.select(&id)).await
}

pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NameRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    apply(&state, &id, |store| store.rename(&id, &payload.name)).await
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let mut store = state.store.lock().await;
    let outcome = store.delete(&id).ok_or_else(|| unknown_project(&id))?;
    Ok(Json(DeleteResponse {
        outcome,
        today: to_today(&store),
    }))
}

pub async fn upsert_log(
    State(state): State<AppState>,
    Path((id, date)): Path<(String, String)>,
    Json(payload): Json<LogValueRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    let date = parse_date(&date)?;
    apply(&state, &id, |store| store.upsert_log(&id, date, payload.value)).await
}

pub async fn delete_log_entry(
    State(state): State<AppState>,
    Path((id, date)): Path<(String, String)>,
) -> Result<Json<TodayResponse>, AppError> {
    let date = parse_date(&date)?;
    let mut store = state.store.lock().await;
    if store.project(&id).is_none() {
        return Err(unknown_project(&id));
    }
    if !store.delete_log_entry(&id, date) {
        return Err(AppError::not_found(format!("no log entry for {}", day_key(date))));
    }
    Ok(Json(to_today(&store)))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let store = state.store.lock().await;
    let start = match query.start.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => store.stats_start(),
    };
    Ok(Json(build_stats(store.projects(), start)))
}

pub async fn set_stats_start(
    State(state): State<AppState>,
    Json(payload): Json<StatsStartRequest>,
) -> Result<Json<StatsResponse>, AppError> {
    let start = parse_date(&payload.start_date)?;
    let mut store = state.store.lock().await;
    store.set_stats_start(start);
    Ok(Json(build_stats(store.projects(), start)))
}

pub async fn undo(State(state): State<AppState>) -> Json<TodayResponse> {
    let mut store = state.store.lock().await;
    store.undo();
    Json(to_today(&store))
}

pub async fn redo(State(state): State<AppState>) -> Json<TodayResponse> {
    let mut store = state.store.lock().await;
    store.redo();
    Json(to_today(&store))
}

pub async fn factory_reset(State(state): State<AppState>) -> Json<TodayResponse> {
    let mut store = state.store.lock().await;
    store.factory_reset();
    Json(to_today(&store))
}

async fn apply(
    state: &AppState,
    id: &str,
    mutation: impl FnOnce(&mut ProjectStore) -> bool,
) -> Result<Json<TodayResponse>, AppError> {
    let mut store = state.store.lock().await;
    // Mutations persist synchronously through `FileStore` while the lock is held.
    if !mutation(&mut *store) {
        return Err(unknown_project(id));
    }
    Ok(Json(to_today(&store)))
}

fn unknown_project(id: &str) -> AppError {
    AppError::not_found(format!("no project with id {id}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_day(raw).ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD"))
}

fn to_today(store: &ProjectStore) -> TodayResponse {
    TodayResponse {
        date: day_key(store.today()),
        active_id: store.active_id().map(str::to_string),
        projects: store
            .visible_today()
            .into_iter()
            .map(|project| to_view(store, project))
            .collect(),
        recent_names: store.recent_names().to_vec(),
        can_undo: store.can_undo(),
        can_redo: store.can_redo(),
    }
}

fn to_view(store: &ProjectStore, project: &Project) -> ProjectView {
    let today = store.today();
    ProjectView {
        id: project.id.clone(),
        name: project.name.clone(),
        count: project.count,
        today_log: project.log_on(today),
        active: store.active_id() == Some(project.id.as_str()),
        archived: project.last_active_date.is_archived(),
        last_active_date: project.last_active_date.to_string(),
        logs: project
            .logs
            .iter()
            .map(|(date, value)| (day_key(*date), *value))
            .collect(),
    }
}
