//! ONNX region detector for QR-code-shaped boxes.
//!
//! Runs a pretrained single-class YOLO-family model over a page image and
//! returns candidate rectangles. Preprocessing letterboxes the page into the
//! model's square input; postprocessing applies only the model family's own
//! default filtering (confidence 0.25, NMS IoU 0.45) and maps boxes back
//! into page coordinates.

use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::{Array4, ArrayViewD};
use ort::session::Session;
use tracing::debug;

use qrx_core::{Error, PageImage, Region, RegionDetector, Result};

use crate::config::DetectorConfig;

/// Background fill for letterbox padding, matching the value the model
/// family trains with (gray 114).
const LETTERBOX_FILL: f32 = 114.0 / 255.0;

pub struct OnnxQrDetector {
    // The session is read-only after construction; the lock serializes
    // inference calls, which the strictly-sequential pipeline never contends
    // on.
    session: Mutex<Session>,
    config: DetectorConfig,
}

impl OnnxQrDetector {
    /// Load the detection model. Expensive; construct once at startup and
    /// share via `Arc`.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(&config.model_path))
            .map_err(|e| {
                Error::Config(format!(
                    "failed to load detector model from {}: {}",
                    config.model_path.display(),
                    e
                ))
            })?;
        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    /// Construct from environment variables (`QRX_MODEL_PATH` etc).
    pub fn from_env() -> Result<Self> {
        Self::new(DetectorConfig::from_env()?)
    }
}

#[async_trait]
impl RegionDetector for OnnxQrDetector {
    async fn detect(&self, page: &PageImage) -> Result<Vec<Region>> {
        let (input, letterbox) = preprocess(page, self.config.input_size);

        let session = self
            .session
            .lock()
            .map_err(|_| Error::Internal("detector session lock poisoned".to_string()))?;
        let outputs = session
            .run(
                ort::inputs!["images" => input.view()]
                    .map_err(|e| Error::Detection(e.to_string()))?,
            )
            .map_err(|e| Error::Detection(e.to_string()))?;
        let output = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Detection(e.to_string()))?;

        let regions = decode_output(
            output,
            letterbox,
            self.config.confidence,
            self.config.nms_iou,
            page.width(),
            page.height(),
        );
        debug!(
            page_width = page.width(),
            page_height = page.height(),
            region_count = regions.len(),
            "detector pass complete"
        );
        Ok(regions)
    }

    async fn health_check(&self) -> Result<bool> {
        // Session construction already validated the model; the lock being
        // healthy is the only runtime condition left.
        Ok(self.session.lock().is_ok())
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Letterbox transform: uniform scale plus centered padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    pub ratio: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

pub(crate) fn letterbox_params(src_width: u32, src_height: u32, target: u32) -> Letterbox {
    let ratio = (target as f32 / src_width as f32).min(target as f32 / src_height as f32);
    let new_w = (src_width as f32 * ratio).round();
    let new_h = (src_height as f32 * ratio).round();
    Letterbox {
        ratio,
        pad_x: (target as f32 - new_w) / 2.0,
        pad_y: (target as f32 - new_h) / 2.0,
    }
}

/// Resize with preserved aspect ratio onto a gray square NCHW tensor,
/// normalized to [0, 1].
fn preprocess(page: &PageImage, target: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = letterbox_params(page.width(), page.height(), target);
    let new_w = ((page.width() as f32 * letterbox.ratio).round() as u32).max(1);
    let new_h = ((page.height() as f32 * letterbox.ratio).round() as u32).max(1);
    let resized =
        image::imageops::resize(page, new_w, new_h, image::imageops::FilterType::Triangle);

    let edge = target as usize;
    let mut input = Array4::<f32>::from_elem((1, 3, edge, edge), LETTERBOX_FILL);
    let x_off = letterbox.pad_x.round() as usize;
    let y_off = letterbox.pad_y.round() as usize;
    for (x, y, pixel) in resized.enumerate_pixels() {
        let row = (y as usize + y_off).min(edge - 1);
        let col = (x as usize + x_off).min(edge - 1);
        for c in 0..3 {
            input[[0, c, row, col]] = pixel[c] as f32 / 255.0;
        }
    }
    (input, letterbox)
}

/// One scored box in page coordinates, pre-NMS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

pub(crate) fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    inter / (area_a + area_b - inter)
}

/// Greedy non-maximum suppression. Output is score-descending; that order
/// is the detector's emission order and is preserved downstream.
pub(crate) fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept: Vec<Candidate> = Vec::new();
    'outer: for candidate in candidates {
        for survivor in &kept {
            if iou(survivor, &candidate) > iou_threshold {
                continue 'outer;
            }
        }
        kept.push(candidate);
    }
    kept
}

/// Decode a raw `[1, 4 + classes, anchors]` model output into clamped page
/// regions.
pub(crate) fn decode_output(
    output: ArrayViewD<'_, f32>,
    letterbox: Letterbox,
    confidence: f32,
    iou_threshold: f32,
    page_width: u32,
    page_height: u32,
) -> Vec<Region> {
    let shape = output.shape();
    if shape.len() != 3 || shape[1] < 5 {
        return Vec::new();
    }
    let rows = shape[1];
    let anchors = shape[2];

    let mut candidates = Vec::new();
    for a in 0..anchors {
        let mut score = 0.0f32;
        for class_row in 4..rows {
            score = score.max(output[[0, class_row, a]]);
        }
        if score < confidence {
            continue;
        }
        let cx = output[[0, 0, a]];
        let cy = output[[0, 1, a]];
        let w = output[[0, 2, a]];
        let h = output[[0, 3, a]];
        candidates.push(Candidate {
            x1: (cx - w / 2.0 - letterbox.pad_x) / letterbox.ratio,
            y1: (cy - h / 2.0 - letterbox.pad_y) / letterbox.ratio,
            x2: (cx + w / 2.0 - letterbox.pad_x) / letterbox.ratio,
            y2: (cy + h / 2.0 - letterbox.pad_y) / letterbox.ratio,
            score,
        });
    }

    nms(candidates, iou_threshold)
        .into_iter()
        .filter_map(|c| {
            let region = Region::new(
                c.x1.max(0.0) as u32,
                c.y1.max(0.0) as u32,
                c.x2.max(0.0).ceil() as u32,
                c.y2.max(0.0).ceil() as u32,
            )
            .clamped(page_width, page_height);
            (region.width() > 0 && region.height() > 0).then_some(region)
        })
        .collect()
}
