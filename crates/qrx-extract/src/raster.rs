//! Rasterizer: turns an ingested document into an ordered page sequence.
//!
//! PDF documents render through Pdfium at a fixed upscaling factor so small
//! printed codes keep enough pixel density for detection; raster inputs
//! decode as a single page. Every page is normalized to three-channel RGB.

use std::env;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};
use tracing::debug;

use qrx_core::{Document, DocumentKind, Error, PageImage, Result};

/// Produce the 1-indexed page sequence for a document.
///
/// Fails with `Error::DocumentDecode` when the bytes cannot be rasterized;
/// there is no partial output.
pub fn rasterize(document: &Document, scale: f32) -> Result<Vec<PageImage>> {
    match document.kind() {
        DocumentKind::Pdf => rasterize_pdf(document.bytes(), scale),
        DocumentKind::Image => Ok(vec![decode_image(document.bytes())?]),
    }
}

fn decode_image(bytes: &[u8]) -> Result<PageImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

fn rasterize_pdf(bytes: &[u8], scale: f32) -> Result<Vec<PageImage>> {
    let pdfium = bind_pdfium()
        .map_err(|e| Error::Config(format!("failed to load Pdfium runtime: {}", e)))?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| Error::DocumentDecode(format!("failed to load PDF document: {}", e)))?;

    let page_count = document.pages().len() as usize;
    let mut pages = Vec::with_capacity(page_count);

    for (index, page) in document.pages().iter().enumerate() {
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Error::DocumentDecode(format!("failed to render page {}: {}", index + 1, e))
        })?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();
        pages.push(rgba_to_rgb(&rgba, width, height)?);
    }

    debug!(pages = pages.len(), scale, "PDF rasterized");
    Ok(pages)
}

fn rgba_to_rgb(rgba: &[u8], width: u32, height: u32) -> Result<PageImage> {
    let mut rgb = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    PageImage::from_raw(width, height, rgb)
        .ok_or_else(|| Error::Internal("rendered page buffer size mismatch".to_string()))
}

/// Resolve a Pdfium binding: explicit env override, then the working
/// directory, then the system library.
pub(crate) fn bind_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
    if let Some(value) = env::var_os("PDFIUM_LIBRARY_PATH") {
        let path = PathBuf::from(value);
        if let Some(result) = try_bind_from_path(&path) {
            return result;
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
}

fn try_bind_from_path(path: &Path) -> Option<std::result::Result<Pdfium, PdfiumError>> {
    if path.is_dir() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        Some(Pdfium::bind_to_library(lib_path).map(Pdfium::new))
    } else if path.exists() {
        Some(Pdfium::bind_to_library(path).map(Pdfium::new))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn png_bytes(image: &PageImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn raster_image_yields_single_rgb_page() {
        let source = PageImage::from_pixel(64, 48, Rgb([10, 20, 30]));
        let document = Document::new(png_bytes(&source), DocumentKind::Image);

        let pages = rasterize(&document, 4.0).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), 64);
        assert_eq!(pages[0].height(), 48);
        assert_eq!(pages[0].get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn grayscale_input_is_normalized_to_rgb() {
        let gray = image::GrayImage::from_pixel(16, 16, image::Luma([128]));
        let mut buf = Vec::new();
        gray.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let document = Document::new(buf, DocumentKind::Image);

        let pages = rasterize(&document, 4.0).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].get_pixel(8, 8), &Rgb([128, 128, 128]));
    }

    #[test]
    fn corrupt_image_bytes_fail_with_document_decode() {
        let document = Document::new(b"definitely not an image".to_vec(), DocumentKind::Image);
        match rasterize(&document, 4.0) {
            Err(Error::DocumentDecode(_)) => {}
            other => panic!("Expected DocumentDecode, got {:?}", other),
        }
    }

    // Minimal valid single-page PDF containing the text "Hello World".
    const HELLO_PDF: &[u8] = b"%PDF-1.0
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj

2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj

3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792]
   /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>
endobj

4 0 obj
<< /Length 44 >>
stream
BT /F1 12 Tf 100 700 Td (Hello World) Tj ET
endstream
endobj

5 0 obj
<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>
endobj

xref
0 6
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000266 00000 n
0000000360 00000 n

trailer
<< /Size 6 /Root 1 0 R >>
startxref
434
%%EOF";

    #[test]
    fn pdf_renders_upscaled_pages() {
        if bind_pdfium().is_err() {
            eprintln!("Skipping pdf_renders_upscaled_pages: no Pdfium library available");
            return;
        }
        let document = Document::new(HELLO_PDF.to_vec(), DocumentKind::Pdf);
        let pages = rasterize(&document, 4.0).unwrap();
        assert_eq!(pages.len(), 1);
        // 612x792pt page at 4x render scale.
        assert!(pages[0].width() > 612);
        assert!(pages[0].height() > 792);
    }

    #[test]
    fn corrupt_pdf_bytes_fail_with_document_decode() {
        if bind_pdfium().is_err() {
            eprintln!("Skipping corrupt_pdf_bytes_fail_with_document_decode: no Pdfium library");
            return;
        }
        let document = Document::new(b"%PDF-1.0 truncated garbage".to_vec(), DocumentKind::Pdf);
        match rasterize(&document, 4.0) {
            Err(Error::DocumentDecode(_)) => {}
            other => panic!("Expected DocumentDecode, got {:?}", other),
        }
    }

    #[test]
    fn rgba_to_rgb_strips_alpha() {
        let rgba = [1u8, 2, 3, 255, 4, 5, 6, 255];
        let page = rgba_to_rgb(&rgba, 2, 1).unwrap();
        assert_eq!(page.get_pixel(0, 0), &Rgb([1, 2, 3]));
        assert_eq!(page.get_pixel(1, 0), &Rgb([4, 5, 6]));
    }

    #[test]
    fn rgba_to_rgb_rejects_short_buffers() {
        assert!(rgba_to_rgb(&[0u8; 4], 2, 2).is_err());
    }
}
