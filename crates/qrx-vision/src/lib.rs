//! # qrx-vision
//!
//! Detection and decoding model backends for qrx.
//!
//! This crate provides:
//! - The ONNX region detector (pretrained single-class model via ONNX Runtime)
//! - The classical rqrr decoder backend (default)
//! - The vision-LLM decoder backend (Ollama)
//! - Env-driven backend configuration
//! - Scripted mock backends for testing (feature `mock`)
//!
//! Backends implement the `RegionDetector` / `RegionDecoder` traits from
//! `qrx-core`; the pipeline never branches on a concrete backend.

pub mod classical;
pub mod config;
pub mod detector;
pub mod ollama;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use qrx_core::*;

pub use classical::RqrrDecoder;
pub use config::{DecoderKind, DetectorConfig};
pub use detector::OnnxQrDetector;
pub use ollama::OllamaVisionDecoder;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockDecoder, MockDetector};
