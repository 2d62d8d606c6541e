//! Document rasterisation: PDF pages → JPEG page images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state; rendering is
//! CPU-bound and not async-safe. `tokio::task::spawn_blocking` keeps the
//! runtime's worker threads free while a page renders.
//!
//! ## Why cap at three pages?
//!
//! Vision models are billed per image tile and resumes rarely exceed two
//! pages. Pages beyond the cap are silently ignored rather than rejected,
//! bounding request size and token cost for pathological uploads.
//!
//! Rasterisation is all-or-nothing: any page failing to render aborts the
//! whole document. The vision tier treats every error here as "vision
//! unavailable" and the pipeline moves on — a missing pdfium library
//! degrades the service, it never breaks a request.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ExtendedColorType;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::document::{DocumentKind, UploadedDocument};
use crate::error::RasterError;
use crate::providers::PageImage;

/// Turn a document into a bounded, ordered sequence of page images.
///
/// PDFs render through pdfium; supported raster images pass through
/// byte-for-byte (with the `image/jpg` alias normalised). Anything else
/// is [`RasterError::UnsupportedFormat`].
pub async fn rasterize(
    doc: &UploadedDocument,
    config: &PipelineConfig,
) -> Result<Vec<PageImage>, RasterError> {
    match doc.kind() {
        DocumentKind::Pdf => {
            let bytes = doc.bytes.clone();
            let max_pages = config.max_vision_pages;
            let scale = config.raster_scale;
            let quality = config.jpeg_quality;

            tokio::task::spawn_blocking(move || {
                rasterize_pdf_blocking(&bytes, max_pages, scale, quality)
            })
            .await
            .map_err(|e| RasterError::RasterizationFailed {
                detail: format!("render task panicked: {e}"),
            })?
        }
        DocumentKind::Image(mime) => Ok(vec![PageImage {
            media_type: mime,
            data: STANDARD.encode(&doc.bytes),
        }]),
        DocumentKind::PlainText | DocumentKind::Other => Err(RasterError::UnsupportedFormat {
            media_type: doc.media_type.clone(),
            filename: doc.filename.clone(),
        }),
    }
}

/// Blocking implementation of PDF page rendering.
fn rasterize_pdf_blocking(
    bytes: &[u8],
    max_pages: usize,
    scale: f32,
    quality: u8,
) -> Result<Vec<PageImage>, RasterError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| RasterError::RasterizationFailed {
            detail: format!("pdfium binding failed: {e:?}"),
        })?;
    let pdfium = Pdfium::new(bindings);

    let document =
        pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| RasterError::RasterizationFailed {
                detail: format!("PDF load failed: {e:?}"),
            })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if total == 0 {
        return Err(RasterError::NoPages);
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let to_render = total.min(max_pages);
    let mut images = Vec::with_capacity(to_render);

    for idx in 0..to_render {
        let page = pages
            .get(idx as u16)
            .map_err(|e| RasterError::RasterizationFailed {
                detail: format!("page {}: {e:?}", idx + 1),
            })?;

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| RasterError::RasterizationFailed {
                    detail: format!("page {}: {e:?}", idx + 1),
                })?;

        let encoded = encode_jpeg(&bitmap.as_image(), quality).map_err(|e| {
            RasterError::RasterizationFailed {
                detail: format!("page {}: JPEG encoding failed: {e}", idx + 1),
            }
        })?;

        debug!(
            "rendered page {}/{} -> {} bytes base64",
            idx + 1,
            to_render,
            encoded.len()
        );
        images.push(PageImage {
            media_type: "image/jpeg".to_string(),
            data: encoded,
        });
    }

    Ok(images)
}

/// JPEG-encode a rendered page and wrap it in base64.
///
/// JPEG rather than PNG: a full-page render compresses roughly 10× better
/// as JPEG, and at quality 80 the text remains legible to a vision model
/// while keeping multi-page requests well under upload limits.
fn encode_jpeg(img: &image::DynamicImage, quality: u8) -> Result<String, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buf);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
    }
    Ok(STANDARD.encode(&buf))
}
