use crate::store::ProjectStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the single project store. Handlers take the lock for the
/// whole mutation, so events are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<ProjectStore>>,
}

impl AppState {
    pub fn new(store: ProjectStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}
