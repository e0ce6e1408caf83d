//! The extraction pipeline: rasterize, detect, crop, decode, collect.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use qrx_core::defaults::{
    ENV_EXPANSION_PAD, ENV_EXPANSION_SCALE, ENV_MISS_SENTINEL, ENV_RENDER_SCALE, RENDER_SCALE,
    SENTINEL_NOT_FOUND,
};
use qrx_core::{
    DecodeMissPolicy, Document, ExtractionReport, PageImage, QrRecord, RegionDecoder,
    RegionDetector, RegionExpansion, Result,
};

use crate::raster::rasterize;

/// Pipeline configuration.
///
/// Read from environment variables at startup; invalid values warn and fall
/// back to the defaults rather than failing the boot.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Per-axis upscaling factor for PDF rendering.
    pub render_scale: f32,
    /// Region expansion policy applied before cropping.
    pub expansion: RegionExpansion,
    /// What to do with detected regions that fail to decode.
    pub miss_policy: DecodeMissPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            render_scale: RENDER_SCALE,
            expansion: RegionExpansion::default(),
            miss_policy: DecodeMissPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from environment variables with fallback to
    /// defaults. A scale-based expansion override wins over a padding one
    /// when both are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(ENV_RENDER_SCALE) {
            match val.parse::<f32>() {
                Ok(s) if s >= 1.0 => config.render_scale = s,
                _ => warn!(value = %val, "Invalid {}, using default", ENV_RENDER_SCALE),
            }
        }

        let scale_override = std::env::var(ENV_EXPANSION_SCALE).ok();
        let pad_override = std::env::var(ENV_EXPANSION_PAD).ok();
        match (scale_override, pad_override) {
            (Some(val), _) => match val.parse::<f32>() {
                Ok(f) if f >= 1.0 => config.expansion = RegionExpansion::Scale(f),
                _ => warn!(value = %val, "Invalid {}, using default expansion", ENV_EXPANSION_SCALE),
            },
            (None, Some(val)) => match val.parse::<u32>() {
                Ok(px) => config.expansion = RegionExpansion::Pad(px),
                _ => warn!(value = %val, "Invalid {}, using default expansion", ENV_EXPANSION_PAD),
            },
            (None, None) => {}
        }

        if let Ok(val) = std::env::var(ENV_MISS_SENTINEL) {
            let sentinel = if val.is_empty() {
                SENTINEL_NOT_FOUND.to_string()
            } else {
                val
            };
            config.miss_policy = DecodeMissPolicy::Sentinel(sentinel);
        }

        config
    }
}

/// The extraction pipeline.
///
/// Holds `Arc`-shared backend singletons; one instance serves every request
/// for the lifetime of the process. Each `run` is strictly sequential:
/// pages in order, then regions in detector-emission order, with no
/// reordering.
pub struct QrExtractor {
    detector: Arc<dyn RegionDetector>,
    decoder: Arc<dyn RegionDecoder>,
    config: ExtractorConfig,
}

impl QrExtractor {
    pub fn new(
        detector: Arc<dyn RegionDetector>,
        decoder: Arc<dyn RegionDecoder>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            detector,
            decoder,
            config,
        }
    }

    pub fn detector(&self) -> &Arc<dyn RegionDetector> {
        &self.detector
    }

    pub fn decoder(&self) -> &Arc<dyn RegionDecoder> {
        &self.decoder
    }

    /// Run the full pipeline over one document.
    ///
    /// Succeeds with an empty `qr_codes` list when nothing decodable is
    /// found; errs only on rasterization failure or a hard backend failure,
    /// in which case no partial report is returned.
    pub async fn run(&self, document: &Document, file_name: &str) -> Result<ExtractionReport> {
        let started = Instant::now();
        let pages = rasterize(document, self.config.render_scale)?;
        let qr_codes = self.extract_from_pages(&pages).await?;

        info!(
            file_name,
            pages = pages.len(),
            decoded_count = qr_codes.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "extraction complete"
        );
        Ok(ExtractionReport {
            file_name: file_name.to_string(),
            qr_codes,
        })
    }

    /// Detect, crop, and decode over an already-rasterized page sequence,
    /// in page order then detector-emission order.
    pub async fn extract_from_pages(&self, pages: &[PageImage]) -> Result<Vec<QrRecord>> {
        let mut qr_codes = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let page_number = (index + 1) as u32;
            let regions = self.detector.detect(page).await?;
            debug!(
                page = page_number,
                region_count = regions.len(),
                "page detection complete"
            );

            for region in regions {
                let expanded =
                    region.expanded(self.config.expansion, page.width(), page.height());
                let crop = expanded.crop(page);
                match self.decoder.decode(&crop).await? {
                    Some(value) => {
                        trace!(page = page_number, "region decoded");
                        qr_codes.push(QrRecord::new(value, page_number));
                    }
                    None => match &self.config.miss_policy {
                        DecodeMissPolicy::Drop => {
                            trace!(page = page_number, "region decode miss, dropped");
                        }
                        DecodeMissPolicy::Sentinel(sentinel) => {
                            qr_codes.push(QrRecord::new(sentinel.clone(), page_number));
                        }
                    },
                }
            }
        }

        Ok(qr_codes)
    }
}
