//! The HTTP read API over the report store.
//!
//! A stateless axum router serving stored reports and harvested images as
//! JSON, plus a server-rendered gallery view. Shared state is the store
//! behind a mutex and the gallery directory path; concurrent requests rely
//! on the mutex, nothing more.
//!
//! Identifier misses return 404 with an `{"error": "…"}` body. Store
//! failures surface as 500 with a generic message and a logged warning.

mod routes;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::RadarConfig;
use crate::db::Store;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
    gallery_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: Store, gallery_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gallery_dir: Arc::new(gallery_dir.into()),
        }
    }
}

/// Build the API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/image/{id}", get(routes::get_image))
        .route("/summary/{id}", get(routes::get_summary))
        .route("/reports/{id}", get(routes::get_report))
        .route("/reports", get(routes::list_reports))
        .route("/summaries/recent", get(routes::recent_summaries))
        .route("/summaries", get(routes::summaries_view))
        .route("/iaq_gallery/{filename}", get(routes::gallery_asset))
        .with_state(state)
}

/// Bind the configured address and serve the read API until shutdown.
pub async fn serve(store: Store, config: &RadarConfig) -> anyhow::Result<()> {
    let state = AppState::new(store, config.gallery_dir.clone());
    let app = router(state);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Error type shared by all handlers, rendered as `{"error": "…"}` JSON.
pub enum ApiError {
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Internal(e) => {
                warn!("Internal server error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}
