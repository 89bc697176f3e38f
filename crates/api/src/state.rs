use std::sync::Arc;

use clubstay_events::NotificationDispatch;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and dispatcher are handles, the config is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: clubstay_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Fire-and-forget booking notifications.
    pub notifications: NotificationDispatch,
}
