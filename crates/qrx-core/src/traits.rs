//! Capability traits for the pluggable vision backends.
//!
//! These define the interfaces concrete detector and decoder
//! implementations must satisfy, enabling interchangeable backends and
//! testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PageImage, Region};

/// Locates QR-code-shaped regions on a page image.
#[async_trait]
pub trait RegionDetector: Send + Sync {
    /// Produce zero or more candidate boxes for one page, in the order the
    /// underlying model emits them. Boxes are already clamped to page
    /// bounds; no additional score filtering is applied downstream.
    async fn detect(&self, page: &PageImage) -> Result<Vec<Region>>;

    /// Check if the detector's backing model is available.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable name of this detector.
    fn name(&self) -> &str;
}

/// Reads a QR payload from a cropped region bitmap.
#[async_trait]
pub trait RegionDecoder: Send + Sync {
    /// Attempt to decode. `Ok(None)` means no readable code in the crop,
    /// which is a normal outcome, never an error. `Err` is reserved for
    /// hard backend failures that should abort the document.
    async fn decode(&self, region: &PageImage) -> Result<Option<String>>;

    /// Check if the decoder's backing model/service is available.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable name of this decoder.
    fn name(&self) -> &str;
}
