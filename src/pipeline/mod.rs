//! Pipeline stages for document entity extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different OCR engine) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ llm ──▶ parse
//! (path/bytes) (pdfium) (tesseract) (completion) (tolerant JSON)
//! ```
//!
//! 1. [`input`]: validate the user-supplied path or uploaded bytes and hand
//!    the rasteriser a real file to open
//! 2. [`render`]: rasterise every page in document order; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`ocr`]: recognise each page image with the tesseract CLI, strictly
//!    in page order (the concatenation is page-numbered)
//! 4. [`llm`]: drive the completion call with retry/backoff; the only
//!    stage with network I/O
//! 5. [`parse`]: tolerant JSON parsing and entity-key filtering

pub mod input;
pub mod llm;
pub mod ocr;
pub mod parse;
pub mod render;
