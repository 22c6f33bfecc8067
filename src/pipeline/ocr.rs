//! Text recognition: run the tesseract CLI over rendered page images.
//!
//! Tesseract is invoked as a subprocess (`tesseract <img> stdout -l <lang>`)
//! rather than through FFI bindings: the CLI is what is actually installed on
//! every platform the tool targets, and a missing binary degrades into a
//! clean [`ExtractError::EngineUnavailable`] instead of a link-time failure.
//!
//! Two failure modes are deliberately kept apart:
//!
//! * the engine itself is unusable (binary not found): fatal for the run;
//! * one page fails to recognise (bad bitmap, tesseract crash): logged and
//!   treated as an empty-text page, because losing one page's text is better
//!   than losing the document.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use image::DynamicImage;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Per-page recognition results plus bookkeeping for stats.
pub struct OcrOutcome {
    /// Page-numbered concatenation of all page texts (see [`assemble_text`]).
    pub text: String,
    /// Pages whose recognition failed and contributed empty text.
    pub empty_pages: usize,
}

/// Recognise every rendered page, strictly in page order.
///
/// The images are written as PNGs into a scoped temp directory for tesseract
/// to open; the directory and its contents are removed when this returns.
pub async fn recognize_pages(
    pages: Vec<(usize, DynamicImage)>,
    config: &ExtractionConfig,
) -> Result<OcrOutcome, ExtractError> {
    let cmd = config.tesseract_cmd.clone();
    let lang = config.ocr_lang.clone();

    tokio::task::spawn_blocking(move || recognize_pages_blocking(pages, &cmd, &lang))
        .await
        .map_err(|e| ExtractError::Internal(format!("OCR task panicked: {e}")))?
}

fn recognize_pages_blocking(
    pages: Vec<(usize, DynamicImage)>,
    tesseract_cmd: &str,
    lang: &str,
) -> Result<OcrOutcome, ExtractError> {
    let work_dir =
        TempDir::new().map_err(|e| ExtractError::Internal(format!("tempdir: {e}")))?;

    let total = pages.len();
    let mut page_texts: Vec<(usize, String)> = Vec::with_capacity(total);
    let mut empty_pages = 0usize;

    for (idx, image) in pages {
        let image_path = work_dir.path().join(format!("page_{:03}.png", idx + 1));
        if let Err(e) = image.save(&image_path) {
            warn!("Page {}: failed to write OCR input image: {}", idx + 1, e);
            empty_pages += 1;
            page_texts.push((idx, String::new()));
            continue;
        }

        match run_tesseract(tesseract_cmd, &image_path, lang) {
            Ok(text) => {
                debug!("Page {}: recognised {} bytes", idx + 1, text.len());
                if text.trim().is_empty() {
                    empty_pages += 1;
                }
                page_texts.push((idx, text));
            }
            // Engine missing is fatal; anything else degrades to an empty page.
            Err(e @ ExtractError::EngineUnavailable { .. }) => return Err(e),
            Err(e) => {
                warn!("Page {}: recognition failed, using empty text: {}", idx + 1, e);
                empty_pages += 1;
                page_texts.push((idx, String::new()));
            }
        }
    }

    info!(
        "OCR done: {}/{} pages recognised",
        total - empty_pages,
        total
    );

    Ok(OcrOutcome {
        text: assemble_text(&page_texts),
        empty_pages,
    })
}

/// Run the tesseract binary on one image, returning the recognised text.
fn run_tesseract(
    tesseract_cmd: &str,
    image_path: &Path,
    lang: &str,
) -> Result<String, ExtractError> {
    let output = Command::new(tesseract_cmd)
        .arg(image_path)
        .arg("stdout")
        .args(["-l", lang])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExtractError::Internal(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractError::EngineUnavailable {
                hint: format!("'{tesseract_cmd}' not found on PATH"),
            })
        }
        Err(e) => Err(ExtractError::EngineUnavailable {
            hint: format!("failed to invoke '{tesseract_cmd}': {e}"),
        }),
    }
}

/// Concatenate per-page texts under ascending `--- Page N ---` headers.
///
/// An N-page document always produces exactly N headers, empty pages
/// included, so the model sees how many pages it is looking at and page
/// references downstream stay honest.
pub fn assemble_text(page_texts: &[(usize, String)]) -> String {
    let mut full_text = String::new();
    for (idx, text) in page_texts {
        full_text.push_str(&format!("\n\n--- Page {} ---\n{}", idx + 1, text));
    }
    full_text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_keeps_ascending_page_markers() {
        let pages = vec![
            (0, "first".to_string()),
            (1, String::new()),
            (2, "third".to_string()),
        ];
        let text = assemble_text(&pages);

        let markers: Vec<usize> = (1..=3)
            .map(|n| text.find(&format!("--- Page {n} ---")).unwrap())
            .collect();
        assert!(markers[0] < markers[1] && markers[1] < markers[2]);
        assert_eq!(text.matches("--- Page").count(), 3);
        assert!(text.contains("first"));
        assert!(text.contains("third"));
    }

    #[test]
    fn assemble_empty_document_is_empty() {
        assert_eq!(assemble_text(&[]), "");
    }

    #[test]
    fn missing_binary_is_engine_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("page.png");
        std::fs::write(&img, b"png-ish").unwrap();

        let err = run_tesseract("definitely-not-tesseract-bin", &img, "eng").unwrap_err();
        assert!(matches!(err, ExtractError::EngineUnavailable { .. }));
    }
}
