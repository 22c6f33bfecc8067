//! Error types for the pdf2fields library.
//!
//! The taxonomy follows the four failure boundaries of the pipeline:
//!
//! * opening/rasterising the PDF ([`ExtractError::DocumentOpen`]),
//! * the OCR engine itself ([`ExtractError::EngineUnavailable`]), distinct
//!   from a single page failing to recognise, which is logged and treated as
//!   an empty-text page rather than an error,
//! * the completion endpoint ([`ExtractError::ServiceUnavailable`]),
//! * the model reply ([`ExtractError::ResponseParse`]).
//!
//! Every variant is non-fatal at the shell level: [`crate::session::DocumentSession`]
//! converts errors into user-visible messages, clears any stale result, and
//! stays usable for the next attempt.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2fields library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Extraction or preview requested on a session with no uploaded document.
    #[error("No document uploaded\nUpload a PDF before extracting.")]
    NoDocument,

    // ── Rasteriser errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and the document cannot be opened.
    #[error("Cannot open PDF '{path}': {detail}\nThe document may be corrupt or truncated.")]
    DocumentOpen { path: PathBuf, detail: String },

    /// pdfium returned an error while rendering a specific page.
    ///
    /// Fatal: the recognised text must cover every page in order, so a
    /// missing page would silently corrupt the page-numbered concatenation.
    #[error("Rasterisation failed for page {page}: {detail}")]
    PageRenderFailed { page: usize, detail: String },

    // ── Recogniser errors ─────────────────────────────────────────────────
    /// The OCR engine binary is missing or misconfigured.
    #[error("OCR engine unavailable: {hint}\nInstall tesseract (apt install tesseract-ocr) or set --tesseract-cmd.")]
    EngineUnavailable { hint: String },

    // ── Extractor errors ──────────────────────────────────────────────────
    /// The completion endpoint was unreachable, timed out, or returned non-2xx.
    #[error("Completion service unavailable at '{endpoint}': {reason}")]
    ServiceUnavailable { endpoint: String, reason: String },

    /// The model reply was not valid JSON, even after extracting the first
    /// balanced object substring.
    #[error("Could not parse model reply as JSON: {detail}")]
    ResponseParse { detail: String, raw: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
         Set PDFIUM_DYNAMIC_LIB_PATH to the directory containing libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Whether a retry with backoff is worth attempting.
    ///
    /// Only transport-level failures qualify; a malformed reply or a corrupt
    /// document will not improve on a second identical request.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractError::ServiceUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_open_display() {
        let e = ExtractError::DocumentOpen {
            path: PathBuf::from("bad.pdf"),
            detail: "xref table missing".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bad.pdf"), "got: {msg}");
        assert!(msg.contains("xref table missing"));
    }

    #[test]
    fn engine_unavailable_display_mentions_tesseract() {
        let e = ExtractError::EngineUnavailable {
            hint: "tesseract not found".into(),
        };
        assert!(e.to_string().contains("tesseract"));
    }

    #[test]
    fn service_unavailable_is_transient() {
        let e = ExtractError::ServiceUnavailable {
            endpoint: "http://localhost:11434/v1".into(),
            reason: "connection refused".into(),
        };
        assert!(e.is_transient());
        assert!(e.to_string().contains("11434"));
    }

    #[test]
    fn response_parse_is_not_transient() {
        let e = ExtractError::ResponseParse {
            detail: "expected value at line 1".into(),
            raw: "Sure! Here is the JSON:".into(),
        };
        assert!(!e.is_transient());
    }
}
