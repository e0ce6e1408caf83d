//! # qrx-api
//!
//! HTTP surface for the qrx extraction service: two ingestion endpoints
//! (multipart upload and remote URL) plus a health probe. All pipeline work
//! is delegated to `qrx-extract`; this crate owns request validation, the
//! temporary spool lifecycle, and error → status mapping.

pub mod error;
pub mod fetch;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use qrx_core::defaults::MAX_UPLOAD_SIZE_BYTES;
use qrx_extract::QrExtractor;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pipeline with its process-wide backend singletons.
    pub extractor: Arc<QrExtractor>,
    /// Client for remote URL ingestion.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(extractor: Arc<QrExtractor>) -> Self {
        Self {
            extractor,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/extract/file", post(handlers::extract_file))
        .route("/api/v1/extract/url", post(handlers::extract_url))
        .route("/healthz", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
