//! PDF rasterisation: render pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Ordering
//!
//! Pages are rendered strictly in document order and every page must render.
//! The recogniser concatenates per-page text under `--- Page N ---` headers,
//! so a silently skipped page would shift every later page number.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Rasterise every page of the PDF, in document order, at `config.dpi`.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples, one per page.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<(usize, DynamicImage)>, ExtractError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;

    tokio::task::spawn_blocking(move || render_pages_blocking(&path, dpi))
        .await
        .map_err(|e| ExtractError::Internal(format!("Render task panicked: {e}")))?
}

/// Rasterise only the first page, at the cheaper preview resolution.
pub async fn render_preview(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<DynamicImage, ExtractError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.preview_dpi;

    let mut pages = tokio::task::spawn_blocking(move || {
        render_pages_range_blocking(&path, dpi, Some(1))
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Preview task panicked: {e}")))??;

    pages
        .pop()
        .map(|(_, img)| img)
        .ok_or_else(|| ExtractError::Internal("PDF declared zero pages".into()))
}

/// Report the declared page count without rendering anything.
pub async fn page_count(pdf_path: &Path) -> Result<usize, ExtractError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path)?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Page-count task panicked: {e}")))?
}

// ── Blocking implementations ─────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ExtractError::DocumentOpen {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
) -> Result<Vec<(usize, DynamicImage)>, ExtractError> {
    render_pages_range_blocking(pdf_path, dpi, None)
}

/// Render the first `limit` pages (all pages when `None`) at `dpi`.
fn render_pages_range_blocking(
    pdf_path: &Path,
    dpi: u32,
    limit: Option<usize>,
) -> Result<Vec<(usize, DynamicImage)>, ExtractError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let wanted = limit.map_or(total_pages, |n| n.min(total_pages));
    info!("PDF loaded: {} pages, rendering {} at {} DPI", total_pages, wanted, dpi);

    let mut results = Vec::with_capacity(wanted);

    for idx in 0..wanted {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ExtractError::PageRenderFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        // Page sizes are in points (1/72 inch); scale to the requested DPI.
        let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
        let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_maximum_height(height_px);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ExtractError::PageRenderFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}
