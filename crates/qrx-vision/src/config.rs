//! Backend configuration, read from environment variables with fallback to
//! centralized defaults.

use std::path::PathBuf;

use qrx_core::defaults::{
    DETECT_CONFIDENCE, DETECT_INPUT_SIZE, DETECT_NMS_IOU, ENV_CONFIDENCE, ENV_DECODER,
    ENV_INPUT_SIZE, ENV_MODEL_PATH, ENV_NMS_IOU,
};
use qrx_core::{Error, Result};

/// Configuration for the ONNX region detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the pretrained single-class detection model (ONNX).
    pub model_path: PathBuf,
    /// Square input edge the model expects.
    pub input_size: u32,
    /// Confidence floor applied in postprocessing (the model family's own
    /// default; nothing downstream filters further).
    pub confidence: f32,
    /// NMS IoU threshold.
    pub nms_iou: f32,
}

impl DetectorConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_size: DETECT_INPUT_SIZE,
            confidence: DETECT_CONFIDENCE,
            nms_iou: DETECT_NMS_IOU,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// The model path is required; threshold overrides fall back to the
    /// defaults with a warning when unparseable.
    pub fn from_env() -> Result<Self> {
        let model_path = std::env::var(ENV_MODEL_PATH).map_err(|_| {
            Error::Config(format!(
                "{} must point at the detector ONNX weights",
                ENV_MODEL_PATH
            ))
        })?;
        let mut config = Self::new(model_path);

        if let Ok(val) = std::env::var(ENV_INPUT_SIZE) {
            match val.parse::<u32>() {
                Ok(size) if size > 0 => config.input_size = size,
                _ => tracing::warn!(value = %val, "Invalid {}, using default", ENV_INPUT_SIZE),
            }
        }
        if let Ok(val) = std::env::var(ENV_CONFIDENCE) {
            match val.parse::<f32>() {
                Ok(c) if (0.0..=1.0).contains(&c) => config.confidence = c,
                _ => tracing::warn!(value = %val, "Invalid {}, using default", ENV_CONFIDENCE),
            }
        }
        if let Ok(val) = std::env::var(ENV_NMS_IOU) {
            match val.parse::<f32>() {
                Ok(t) if (0.0..=1.0).contains(&t) => config.nms_iou = t,
                _ => tracing::warn!(value = %val, "Invalid {}, using default", ENV_NMS_IOU),
            }
        }

        Ok(config)
    }
}

/// Decoder backend selection.
///
/// Picked once at configuration time; the pipeline only ever sees the
/// `RegionDecoder` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderKind {
    /// Classical computer-vision decode via rqrr.
    #[default]
    Classical,
    /// Vision-LLM decode via an Ollama server.
    Vision,
}

impl DecoderKind {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classical" | "rqrr" | "cv" => Some(Self::Classical),
            "vision" | "ollama" | "learned" => Some(Self::Vision),
            _ => None,
        }
    }

    /// Read the backend selection from the environment, defaulting to
    /// classical with a warning on unknown values.
    pub fn from_env() -> Self {
        match std::env::var(ENV_DECODER) {
            Ok(val) => DecoderKind::from_str_loose(&val).unwrap_or_else(|| {
                tracing::warn!(value = %val, "Invalid {}, using classical decoder", ENV_DECODER);
                Self::Classical
            }),
            Err(_) => Self::Classical,
        }
    }
}

impl std::fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classical => write!(f, "classical"),
            Self::Vision => write!(f, "vision"),
        }
    }
}
