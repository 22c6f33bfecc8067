//! Top-level extraction entry points.
//!
//! The pipeline is strictly linear and synchronous by design: rasterise every
//! page, recognise them one at a time in order, make a single completion
//! call, parse. There is no per-page concurrency (the recognised text is a
//! page-numbered concatenation, so ordering is load-bearing) and no
//! background work survives a call returning.

use crate::category::DocumentCategory;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::llm::{
    CompletionClient, CompletionRequest, HttpCompletionClient, request_completion,
};
use crate::pipeline::{input, ocr, parse, render};
use crate::prompts::{build_extraction_prompt, DEFAULT_SYSTEM_PROMPT};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the category's entities from a PDF file on disk.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Any [`ExtractError`]; all of them are non-fatal to the process, so callers
/// report them and may retry with the same session.
pub async fn extract(
    pdf_path: impl AsRef<Path>,
    category: DocumentCategory,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let resolved = input::resolve_local(pdf_path.as_ref())?;
    run_pipeline(resolved.path(), category, config).await
}

/// Extract entities from PDF bytes held in memory (an "upload").
///
/// The bytes are written to a managed temp file for pdfium to open; the file
/// is deleted when this returns, on success and on every failure path.
pub async fn extract_from_bytes(
    bytes: &[u8],
    category: DocumentCategory,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let resolved = input::resolve_bytes(bytes)?;
    // `resolved` owns the temp file; dropped (and deleted) when we return.
    run_pipeline(resolved.path(), category, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    pdf_path: impl AsRef<Path>,
    category: DocumentCategory,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(pdf_path, category, config))
}

/// Rasterise and recognise only, without a completion call.
///
/// Returns the page-numbered text the extractor would have seen. Useful for
/// checking what OCR makes of a document before spending a model call on it.
pub async fn recognize(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    let resolved = input::resolve_local(pdf_path.as_ref())?;
    let pages = render::render_pages(resolved.path(), config).await?;
    let outcome = ocr::recognize_pages(pages, config).await?;
    Ok(outcome.text)
}

/// Render the first page as a PNG at the preview resolution.
pub async fn preview_first_page(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Vec<u8>, ExtractError> {
    let resolved = input::resolve_local(pdf_path.as_ref())?;
    encode_preview(resolved.path(), config).await
}

/// [`preview_first_page`] for uploaded bytes; same temp-file lifecycle as
/// [`extract_from_bytes`].
pub async fn preview_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<Vec<u8>, ExtractError> {
    let resolved = input::resolve_bytes(bytes)?;
    encode_preview(resolved.path(), config).await
}

async fn encode_preview(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<u8>, ExtractError> {
    let image = render::render_preview(pdf_path, config).await?;

    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ExtractError::Internal(format!("PNG encoding failed: {e}")))?;

    debug!("Preview encoded → {} bytes PNG", buf.len());
    Ok(buf)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the completion client: caller-injected, else HTTP from config.
fn resolve_client(config: &ExtractionConfig) -> Result<Arc<dyn CompletionClient>, ExtractError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    Ok(Arc::new(HttpCompletionClient::from_config(config)?))
}

/// Rasterise → recognise → extract for an already-validated PDF path.
async fn run_pipeline(
    pdf_path: &Path,
    category: DocumentCategory,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    info!(
        "Starting extraction: {} (category: {})",
        pdf_path.display(),
        category
    );

    let client = resolve_client(config)?;

    // ── Rasterise ────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let pages = render::render_pages(pdf_path, config).await?;
    let total_pages = pages.len();
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", total_pages, render_duration_ms);

    // ── Recognise ────────────────────────────────────────────────────────
    let ocr_start = Instant::now();
    let ocr_outcome = ocr::recognize_pages(pages, config).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    info!(
        "OCR produced {} bytes of text in {}ms",
        ocr_outcome.text.len(),
        ocr_duration_ms
    );

    // ── Extract ──────────────────────────────────────────────────────────
    let request = CompletionRequest {
        system: config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        user: build_extraction_prompt(category, &ocr_outcome.text),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let llm_start = Instant::now();
    let (reply, retries) = request_completion(&client, &request, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    debug!("Model replied with {} bytes in {}ms", reply.len(), llm_duration_ms);

    let entities = parse::parse_entities(&reply, category)?;

    let stats = ExtractionStats {
        total_pages,
        empty_ocr_pages: ocr_outcome.empty_pages,
        render_duration_ms,
        ocr_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        retries,
    };

    info!(
        "Extraction complete: {} pages, {}ms total",
        total_pages, stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        category,
        entities,
        recognized_text: ocr_outcome.text,
        stats,
    })
}
