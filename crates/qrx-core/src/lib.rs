//! # qrx-core
//!
//! Core types, traits, and abstractions for the qrx QR extraction service.
//!
//! This crate provides the data model, the error type, the pluggable
//! detector/decoder traits, and the centralized default constants that the
//! other qrx crates depend on.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    DecodeMissPolicy, Document, DocumentKind, ExtractionReport, PageImage, QrRecord, Region,
    RegionExpansion,
};
pub use traits::{RegionDecoder, RegionDetector};
