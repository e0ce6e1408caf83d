//! Classical computer-vision QR decoder backed by rqrr.

use async_trait::async_trait;
use tracing::trace;

use qrx_core::{PageImage, RegionDecoder, Result};

/// Decodes QR payloads from region crops with rqrr's grid detector.
///
/// Detector crops are clean page renders rather than camera frames, so a
/// single plain pass is enough; no preprocessing cascade is applied.
pub struct RqrrDecoder;

#[async_trait]
impl RegionDecoder for RqrrDecoder {
    async fn decode(&self, region: &PageImage) -> Result<Option<String>> {
        let gray = image::imageops::grayscale(region);
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32)[0],
        );

        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, content)) if !content.is_empty() => return Ok(Some(content)),
                Ok(_) => continue,
                Err(e) => {
                    // Unreadable grid in an otherwise valid crop: a normal
                    // miss, not a failure.
                    trace!(error = %e, "grid present but undecodable");
                    continue;
                }
            }
        }
        Ok(None)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "rqrr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Render a payload into a clean QR bitmap, one module per
    /// `module_px`-sized block with a quiet zone around it.
    fn qr_image(payload: &str, module_px: u32, quiet_modules: u32) -> PageImage {
        let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
        let width = code.width() as u32;
        let colors = code.to_colors();
        let total = (width + 2 * quiet_modules) * module_px;
        let mut img = PageImage::from_pixel(total, total, Rgb([255, 255, 255]));
        for y in 0..width {
            for x in 0..width {
                if colors[(y * width + x) as usize] == qrcode::Color::Dark {
                    for dy in 0..module_px {
                        for dx in 0..module_px {
                            img.put_pixel(
                                (x + quiet_modules) * module_px + dx,
                                (y + quiet_modules) * module_px + dy,
                                Rgb([0, 0, 0]),
                            );
                        }
                    }
                }
            }
        }
        img
    }

    #[tokio::test]
    async fn decodes_url_payload() {
        let img = qr_image("https://example.com", 8, 4);
        let result = RqrrDecoder.decode(&img).await.unwrap();
        assert_eq!(result.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn decodes_plain_text_payload() {
        let img = qr_image("hello qrx", 8, 4);
        let result = RqrrDecoder.decode(&img).await.unwrap();
        assert_eq!(result.as_deref(), Some("hello qrx"));
    }

    #[tokio::test]
    async fn blank_crop_is_a_miss_not_an_error() {
        let img = PageImage::from_pixel(120, 120, Rgb([255, 255, 255]));
        let result = RqrrDecoder.decode(&img).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn non_qr_content_is_a_miss() {
        // Checkerboard: high-frequency structure but no finder patterns.
        let img = PageImage::from_fn(120, 120, |x, y| {
            if (x / 10 + y / 10) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let result = RqrrDecoder.decode(&img).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn health_check_is_always_available() {
        assert!(RqrrDecoder.health_check().await.unwrap());
        assert_eq!(RqrrDecoder.name(), "rqrr");
    }
}
