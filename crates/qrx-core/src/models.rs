//! Data model for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::defaults::ALLOWED_EXTENSIONS;

/// One rasterized page (or the sole image of a raster document), always
/// normalized to three-channel RGB.
pub type PageImage = image::RgbImage;

/// Declared kind of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Infer the kind from a file name's extension.
    ///
    /// Only extensions on the allow-list resolve; everything else is `None`
    /// and must be rejected before the pipeline runs.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        if ext == "pdf" {
            Some(DocumentKind::Pdf)
        } else {
            Some(DocumentKind::Image)
        }
    }

    /// Infer the kind from an HTTP content-type header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("pdf") {
            return Some(DocumentKind::Pdf);
        }
        for subtype in ["jpeg", "jpg", "png", "bmp", "gif", "tiff", "webp"] {
            if ct.contains(&format!("image/{}", subtype)) {
                return Some(DocumentKind::Image);
            }
        }
        None
    }

    /// Infer the kind from magic bytes. Used as a fallback when the
    /// declared extension and content-type disagree or are absent.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let kind = infer::get(bytes)?;
        let mime = kind.mime_type();
        if mime == "application/pdf" {
            Some(DocumentKind::Pdf)
        } else if mime.starts_with("image/") {
            Some(DocumentKind::Image)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Image => write!(f, "image"),
        }
    }
}

/// An ingested document: raw bytes plus the kind the host resolved for them.
///
/// Immutable once constructed. The backing temporary storage (if any) is
/// owned by the host request, not by this type.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    kind: DocumentKind,
}

impl Document {
    pub fn new(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        Self { bytes, kind }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// Region expansion policy applied to detector boxes before cropping.
///
/// `Scale` grows the box about its centroid by a multiplicative factor and
/// adapts to box size; `Pad` grows every side by a constant pixel margin.
/// Both clamp to page bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionExpansion {
    Scale(f32),
    Pad(u32),
}

impl Default for RegionExpansion {
    fn default() -> Self {
        RegionExpansion::Scale(crate::defaults::EXPANSION_SCALE)
    }
}

/// Policy for detected regions that fail to decode.
///
/// `Drop` (canonical) filters them silently. `Sentinel` appends a record
/// carrying the given literal value instead, matching an older deployment's
/// behavior; it is opt-in only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DecodeMissPolicy {
    #[default]
    Drop,
    Sentinel(String),
}

/// An axis-aligned candidate rectangle within a page image.
///
/// `x2`/`y2` are exclusive crop bounds. Detector output is normalized into
/// this form before it reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Apply an expansion policy, clamped to `[0, page_width] x [0, page_height]`.
    ///
    /// Never produces a rectangle outside the page, including for boxes that
    /// already touch the page edge.
    pub fn expanded(&self, policy: RegionExpansion, page_width: u32, page_height: u32) -> Region {
        let expanded = match policy {
            RegionExpansion::Scale(factor) => {
                let factor = factor.max(1.0);
                let cx = (self.x1 as f32 + self.x2 as f32) / 2.0;
                let cy = (self.y1 as f32 + self.y2 as f32) / 2.0;
                let half_w = (self.width() as f32 * factor) / 2.0;
                let half_h = (self.height() as f32 * factor) / 2.0;
                Region {
                    x1: (cx - half_w).floor().max(0.0) as u32,
                    y1: (cy - half_h).floor().max(0.0) as u32,
                    x2: (cx + half_w).ceil() as u32,
                    y2: (cy + half_h).ceil() as u32,
                }
            }
            RegionExpansion::Pad(px) => Region {
                x1: self.x1.saturating_sub(px),
                y1: self.y1.saturating_sub(px),
                x2: self.x2.saturating_add(px),
                y2: self.y2.saturating_add(px),
            },
        };
        expanded.clamped(page_width, page_height)
    }

    /// Clamp to page bounds, keeping `x1 <= x2` and `y1 <= y2`.
    pub fn clamped(&self, page_width: u32, page_height: u32) -> Region {
        let x2 = self.x2.min(page_width);
        let y2 = self.y2.min(page_height);
        Region {
            x1: self.x1.min(x2),
            y1: self.y1.min(y2),
            x2,
            y2,
        }
    }

    /// Crop this region out of a page as a new bitmap.
    ///
    /// The caller must have clamped the region to the page first. The source
    /// page is not modified.
    pub fn crop(&self, page: &PageImage) -> PageImage {
        image::imageops::crop_imm(page, self.x1, self.y1, self.width(), self.height()).to_image()
    }
}

/// One successfully decoded QR code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QrRecord {
    /// Freshly generated UUIDv4, unique within a report.
    pub id: String,
    /// Decoded payload.
    pub value: String,
    /// 1-based page number within the rasterized sequence.
    pub page: u32,
}

impl QrRecord {
    pub fn new(value: String, page: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            value,
            page,
        }
    }
}

/// The full extraction result for one document. The sole externally visible
/// artifact; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionReport {
    pub file_name: String,
    pub qr_codes: Vec<QrRecord>,
}
