use std::sync::Arc;

use pulsewatch::{LibsqlStore, StatusService};

/// Shared across workers
pub struct AppState {
    pub store: Arc<LibsqlStore>,
    pub status: StatusService,
}

impl AppState {
    pub fn new(store: Arc<LibsqlStore>) -> Self {
        let status = StatusService::new(store.clone());
        Self { store, status }
    }
}
