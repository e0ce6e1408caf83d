//! Centralized default constants for the qrx system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// RASTERIZATION
// =============================================================================

/// Fixed per-axis upscaling factor applied when rendering PDF pages.
/// Raises pixel density so small printed QR codes survive detection.
pub const RENDER_SCALE: f32 = 4.0;

/// Environment variable overriding the render scale.
pub const ENV_RENDER_SCALE: &str = "QRX_RENDER_SCALE";

// =============================================================================
// DETECTION
// =============================================================================

/// Square input edge the detector letterboxes pages into.
pub const DETECT_INPUT_SIZE: u32 = 640;

/// Confidence floor applied during postprocessing. This is the pretrained
/// model family's own default; the pipeline applies no further filtering.
pub const DETECT_CONFIDENCE: f32 = 0.25;

/// IoU threshold for non-maximum suppression, again the model's default.
pub const DETECT_NMS_IOU: f32 = 0.45;

/// Environment variable for the ONNX detector weights path.
pub const ENV_MODEL_PATH: &str = "QRX_MODEL_PATH";

/// Environment variable overriding the detector input size.
pub const ENV_INPUT_SIZE: &str = "QRX_INPUT_SIZE";

/// Environment variable overriding the confidence floor.
pub const ENV_CONFIDENCE: &str = "QRX_CONFIDENCE";

/// Environment variable overriding the NMS IoU threshold.
pub const ENV_NMS_IOU: &str = "QRX_NMS_IOU";

// =============================================================================
// REGION EXPANSION
// =============================================================================

/// Default centroid-scale expansion factor for detector boxes.
pub const EXPANSION_SCALE: f32 = 1.25;

/// Environment variable selecting a scale-based expansion factor.
pub const ENV_EXPANSION_SCALE: &str = "QRX_EXPANSION_SCALE";

/// Environment variable selecting a fixed-pixel padding expansion instead.
pub const ENV_EXPANSION_PAD: &str = "QRX_EXPANSION_PAD";

// =============================================================================
// DECODING
// =============================================================================

/// Environment variable selecting the decoder backend ("classical" | "vision").
pub const ENV_DECODER: &str = "QRX_DECODER";

/// Environment variable enabling the legacy sentinel miss policy. When set,
/// detected-but-undecodable regions produce a record carrying this value.
pub const ENV_MISS_SENTINEL: &str = "QRX_MISS_SENTINEL";

/// Sentinel value an older deployment emitted for undecodable regions.
/// Only used when the sentinel policy is explicitly configured.
pub const SENTINEL_NOT_FOUND: &str = "not found";

// =============================================================================
// VISION DECODER BACKEND
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default vision model for the learned decoder backend.
pub const DEFAULT_VISION_MODEL: &str = "qwen3-vl:8b";

/// Environment variable for the vision model name.
pub const ENV_VISION_MODEL: &str = "QRX_VISION_MODEL";

/// Timeout for one vision decode request in seconds.
pub const VISION_DECODE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8001;

/// Environment variable overriding the server port.
pub const ENV_SERVER_PORT: &str = "QRX_PORT";

/// Maximum request body size in bytes (50 MB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Timeout for fetching a remote document URL, in seconds.
pub const URL_FETCH_TIMEOUT_SECS: u64 = 30;

/// File extensions accepted by the ingestion endpoints (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "bmp", "gif", "tiff", "webp",
];
