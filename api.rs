//! HTTP read API over the shared store.
//!
//! ## Endpoints
//!
//! - `GET /health` - `{"status":"healthy"}` when the store answers `PING`
//! - `GET /api/v1/tph` - latest temperature, pressure and humidity reading

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::{RecordError, StoreError};
use crate::store::{Store, TphRecord, TPH_KEY};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No TPH data available")]
    NotFound,

    #[error("Error processing TPH data")]
    Schema(#[source] RecordError),

    #[error("Data store unavailable")]
    Unavailable(#[source] StoreError),

    #[error("Service unhealthy")]
    Unhealthy(#[source] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) | ApiError::Unhealthy(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.store.ping().await.map_err(|e| {
        error!(error = %e, "health check failed");
        ApiError::Unhealthy(e)
    })?;
    Ok(Json(HealthResponse { status: "healthy" }))
}

pub async fn get_tph(State(state): State<AppState>) -> Result<Json<TphRecord>, ApiError> {
    let raw = state
        .store
        .get(TPH_KEY)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to reach data store");
            ApiError::Unavailable(e)
        })?
        .filter(|raw| !raw.is_empty())
        .ok_or(ApiError::NotFound)?;

    let record = TphRecord::parse(&raw).map_err(|e| {
        error!(error = %e, "error processing TPH data");
        ApiError::Schema(e)
    })?;
    Ok(Json(record))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tph", get(get_tph))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::store::MemoryStore;

    async fn call(store: Arc<MemoryStore>, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = create_router(AppState::new(store));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = call(store.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "healthy"}));

        store.set_unavailable(true);
        let (status, body) = call(store, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({"detail": "Service unhealthy"}));
    }

    #[tokio::test]
    async fn store_down_is_503() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let (status, body) = call(store, "/api/v1/tph").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({"detail": "Data store unavailable"}));
    }

    #[tokio::test]
    async fn missing_record_is_404() {
        let (status, body) = call(Arc::new(MemoryStore::new()), "/api/v1/tph").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"detail": "No TPH data available"}));
    }

    #[tokio::test]
    async fn empty_record_is_404() {
        let store = Arc::new(MemoryStore::new());
        store.set(TPH_KEY, String::new()).await.unwrap();
        let (status, body) = call(store, "/api/v1/tph").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"detail": "No TPH data available"}));
    }
}
