//! # pdf2fields
//!
//! Extract a fixed set of named fields from scanned PDF documents using OCR
//! and a locally hosted language model.
//!
//! ## Why this crate?
//!
//! Marksheets, offer letters, and similar paperwork arrive as scans: no text
//! layer, inconsistent layouts, but the same handful of fields every time.
//! Template-based extractors break on every new layout. This crate rasterises
//! each page, lets tesseract read it, and asks a local LLM for exactly the
//! fields the document category defines (name, date, total marks), returning
//! a flat JSON-serialisable mapping.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate path or uploaded bytes (magic check, temp file)
//!  ├─ 2. Render     rasterise every page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Recognise  tesseract per page, concatenated under page headers
//!  ├─ 4. Extract    one chat completion against a local endpoint (Ollama)
//!  └─ 5. Parse      tolerant JSON → entity → value-or-null mapping
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2fields::{extract, DocumentCategory, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Defaults target a local Ollama at http://localhost:11434/v1
//!     let config = ExtractionConfig::default();
//!     let output = extract("marksheet.pdf", DocumentCategory::Marksheet, &config).await?;
//!     print!("{}", output.render_report());
//!     output.write_artifact(output.artifact_filename())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2fields` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2fields = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! The `tesseract` binary must be installed (`apt install tesseract-ocr`);
//! its location is configurable via [`ExtractionConfig::tesseract_cmd`].
//! The completion endpoint is any OpenAI-compatible `/chat/completions`
//! server; the default assumes Ollama serving `llama3.1` locally.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod category;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use category::DocumentCategory;
pub use config::{ExtractionConfig, ExtractionConfigBuilder, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use error::ExtractError;
pub use extract::{
    extract, extract_from_bytes, extract_sync, preview_first_page, preview_from_bytes, recognize,
};
pub use output::{EntityMap, ExtractionOutput, ExtractionStats};
pub use pipeline::llm::{CompletionClient, CompletionRequest, HttpCompletionClient};
pub use session::{DocumentSession, SessionState, UploadedDocument};
