// crates/bizclass-server/src/web/state.rs
// Web server state management

use std::sync::Arc;

use crate::db::DatabasePool;
use crate::service::ClassificationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The classification pipeline and its caches
    pub service: Arc<ClassificationService>,
    /// Backing database, when the service runs on SQLite
    pub pool: Option<Arc<DatabasePool>>,
}

impl AppState {
    pub fn new(service: Arc<ClassificationService>) -> Self {
        Self {
            service,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: Arc<DatabasePool>) -> Self {
        self.pool = Some(pool);
        self
    }
}
