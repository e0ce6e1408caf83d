//! Remote document ingestion.

use url::Url;

use qrx_core::defaults::URL_FETCH_TIMEOUT_SECS;
use qrx_core::DocumentKind;

use crate::error::ApiError;

/// A document fetched from a remote URL, with its resolved kind and the
/// file name derived from the URL path.
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
    pub file_name: String,
}

/// Download a document, resolving its kind from the response content-type
/// with a magic-byte fallback. Unreachable URLs and unsupported content
/// types are client errors; nothing here reaches the pipeline.
pub async fn fetch_document(
    client: &reqwest::Client,
    raw_url: &str,
) -> Result<FetchedDocument, ApiError> {
    let parsed =
        Url::parse(raw_url).map_err(|e| ApiError::BadRequest(format!("Invalid URL: {}", e)))?;

    let response = client
        .get(parsed.clone())
        .timeout(std::time::Duration::from_secs(URL_FETCH_TIMEOUT_SECS))
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ApiError::BadRequest(format!("Could not retrieve file from URL: {}", e)))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Could not retrieve file from URL: {}", e)))?
        .to_vec();

    let kind = DocumentKind::from_content_type(&content_type)
        .or_else(|| DocumentKind::sniff(&bytes))
        .ok_or_else(|| {
            ApiError::BadRequest(
                "The URL does not point to a supported file format \
                 (PDF, JPG, JPEG, PNG, BMP, GIF, TIFF, WebP)."
                    .to_string(),
            )
        })?;

    let file_name = file_name_from_url(&parsed);
    Ok(FetchedDocument {
        bytes,
        kind,
        file_name,
    })
}

/// Basename of the URL path, falling back to a constant for bare hosts.
pub(crate) fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("document")
        .to_string()
}
