use std::sync::Arc;

use threads_db::Database;
use tracing::error;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::oauth::GoogleClient;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: ApiConfig,
    pub google: Option<GoogleClient>,
}

impl AppStateInner {
    pub fn new(db: Database, config: ApiConfig) -> AppState {
        let google = config.google.clone().map(GoogleClient::new);
        Arc::new(Self { db, config, google })
    }
}

/// Run a blocking database call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("background task failed"))
        })?
        .map_err(ApiError::from)
}
