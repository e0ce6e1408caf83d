//! # qrx-extract
//!
//! The qrx extraction pipeline: rasterize a document into page images, run
//! the region detector over each page, crop and decode candidate regions,
//! and assemble the final report.
//!
//! Model backends are injected as `Arc<dyn RegionDetector>` /
//! `Arc<dyn RegionDecoder>`; this crate never touches a concrete backend.

pub mod extractor;
pub mod raster;

// Re-export core types
pub use qrx_core::*;

pub use extractor::{ExtractorConfig, QrExtractor};
pub use raster::rasterize;
