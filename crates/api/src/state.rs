use std::sync::Arc;

use crate::audit::AuditService;
use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest sits behind
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: crm_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub audit: AuditService,
}

impl AppState {
    pub fn new(pool: crm_db::DbPool, config: ServerConfig) -> Self {
        Self {
            audit: AuditService::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }

    /// Release shared resources once the server has stopped accepting
    /// requests.
    pub async fn teardown(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
