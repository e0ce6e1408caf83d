//! HTTP handlers for the extraction endpoints.

use std::io::Write;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::debug;

use qrx_core::{Document, DocumentKind, ExtractionReport};

use crate::error::ApiError;
use crate::fetch;
use crate::AppState;

/// Extract QR codes from an uploaded document file.
///
/// Accepts a multipart form with a `file` part. The file name's extension
/// must be on the allow-list; anything else is rejected before the pipeline
/// runs.
pub async fn extract_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionReport>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".to_string()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            file = Some((file_name, data.to_vec()));
            break;
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' part in upload".to_string()))?;
    let kind = DocumentKind::from_file_name(&file_name).ok_or_else(|| {
        ApiError::BadRequest(
            "Only PDF, JPG, JPEG, PNG, BMP, GIF, TIFF, and WebP files are allowed.".to_string(),
        )
    })?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let report = run_extraction(&state, &data, kind, &file_name).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ExtractUrlRequest {
    pub url: String,
}

/// Extract QR codes from a document fetched from a remote URL.
///
/// The response content-type must map to a supported kind (magic-byte
/// sniffing as a fallback); anything else is a 400.
pub async fn extract_url(
    State(state): State<AppState>,
    Json(req): Json<ExtractUrlRequest>,
) -> Result<Json<ExtractionReport>, ApiError> {
    let fetched = fetch::fetch_document(&state.http, &req.url).await?;
    let report = run_extraction(&state, &fetched.bytes, fetched.kind, &fetched.file_name).await?;
    Ok(Json(report))
}

/// Backend availability probe.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let detector_ok = state
        .extractor
        .detector()
        .health_check()
        .await
        .unwrap_or(false);
    let decoder_ok = state
        .extractor
        .decoder()
        .health_check()
        .await
        .unwrap_or(false);
    Json(serde_json::json!({
        "status": if detector_ok && decoder_ok { "ok" } else { "degraded" },
        "detector": detector_ok,
        "decoder": decoder_ok,
    }))
}

/// Spool the ingested bytes to request-owned temporary storage and run the
/// pipeline against it.
///
/// The `NamedTempFile` guard deletes the spool on every exit path, whether
/// the pipeline succeeds or fails.
async fn run_extraction(
    state: &AppState,
    data: &[u8],
    kind: DocumentKind,
    file_name: &str,
) -> Result<ExtractionReport, ApiError> {
    let mut spool = NamedTempFile::new().map_err(|e| {
        tracing::error!(error = %e, "failed to create temp spool");
        ApiError::Internal
    })?;
    spool.write_all(data).map_err(|e| {
        tracing::error!(error = %e, "failed to write temp spool");
        ApiError::Internal
    })?;
    debug!(file_name, %kind, bytes = data.len(), spool = %spool.path().display(), "document spooled");

    let bytes = std::fs::read(spool.path()).map_err(|e| {
        tracing::error!(error = %e, "failed to read temp spool");
        ApiError::Internal
    })?;
    let document = Document::new(bytes, kind);
    let report = state.extractor.run(&document, file_name).await?;
    Ok(report)
}
