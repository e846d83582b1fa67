pub mod auth;
pub mod jobs;
pub mod properties;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::directory::UserDirectory;
use crate::error::{Error, Result};
use crate::lifecycle::JobBoard;
use crate::media::MediaStore;
use crate::registry::PropertyRegistry;

/// Shared handles behind every request handler. User and property records
/// are read-mostly and sit behind coarse locks; per-job locking is the
/// board's own concern.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RwLock<UserDirectory>>,
    pub registry: Arc<RwLock<PropertyRegistry>>,
    pub board: Arc<JobBoard>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            directory: Arc::new(RwLock::new(UserDirectory::new())),
            registry: Arc::new(RwLock::new(PropertyRegistry::new())),
            board: Arc::new(JobBoard::new(config.require_checklist_complete)),
            tokens: Arc::new(TokenService::new(&config.auth)),
            media: Arc::new(MediaStore::new(&config.media_dir)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/auth", auth::router())
        .nest("/properties/", properties::router())
        .nest("/jobs/", jobs::router())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind and serve until the shutdown token fires, then drain gracefully.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(state);

    tracing::info!(addr = %config.listen_addr, "Starting API server");
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| Error::Internal(format!("failed to bind {}: {}", config.listen_addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| Error::Internal(format!("server failed: {}", e)))
}

/// Default and cap for list endpoints; keeps responses bounded no matter
/// what the caller asks for.
pub(crate) fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 100)
}
