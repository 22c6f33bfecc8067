//! The interactive shell's session state, as an explicit state machine.
//!
//! A session holds at most one uploaded document and at most one extraction
//! result. The transitions are the whole contract:
//!
//! ```text
//! NoDocument ──upload──▶ DocumentLoaded ──extract ok──▶ DocumentLoadedWithResult
//!     ▲                     │    ▲                            │
//!     │                     │    └────extract failed──────────┘
//!     └───────clear─────────┴──(new upload replaces + clears)─┘
//! ```
//!
//! Two invariants are enforced here:
//!
//! * a failed extraction **clears** any stale prior result instead of leaving
//!   it on screen next to an error message;
//! * the category is bound to the result at request time, so labels are
//!   rendered with the category the extraction actually used, not whatever
//!   the selector says by the time the result is read.
//!
//! The struct is deliberately UI-framework-free so the transitions are
//! testable without any widget toolkit; the CLI binary is one front-end.

use crate::category::DocumentCategory;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::{extract_from_bytes, preview_from_bytes};
use crate::output::ExtractionOutput;
use tracing::info;

/// Discriminant of the session state, for UIs that switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing uploaded yet.
    NoDocument,
    /// A document is loaded; no (current) result.
    DocumentLoaded,
    /// A document is loaded and the last extraction succeeded.
    DocumentLoadedWithResult,
}

/// An uploaded document: original filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Ephemeral per-session state: the uploaded file and the last result.
#[derive(Debug, Default)]
pub struct DocumentSession {
    document: Option<UploadedDocument>,
    result: Option<ExtractionOutput>,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (&self.document, &self.result) {
            (None, _) => SessionState::NoDocument,
            (Some(_), None) => SessionState::DocumentLoaded,
            (Some(_), Some(_)) => SessionState::DocumentLoadedWithResult,
        }
    }

    /// Load a document, replacing any prior one and clearing its result.
    pub fn upload(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        info!("Session: uploaded '{}' ({} bytes)", name, bytes.len());
        self.document = Some(UploadedDocument { name, bytes });
        self.result = None;
    }

    /// Drop the document and any result: back to *no-document*.
    pub fn clear(&mut self) {
        self.document = None;
        self.result = None;
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    /// The last successful extraction, if the session still holds one.
    pub fn result(&self) -> Option<&ExtractionOutput> {
        self.result.as_ref()
    }

    /// Run the full pipeline on the uploaded document.
    ///
    /// Blocks (asynchronously) until rasterisation, recognition, and the
    /// completion call all finish. On failure the stale result is cleared and
    /// the error returned; the session remains usable: upload again, fix the
    /// endpoint, or just retry.
    pub async fn extract(
        &mut self,
        category: DocumentCategory,
        config: &ExtractionConfig,
    ) -> Result<&ExtractionOutput, ExtractError> {
        let document = self.document.as_ref().ok_or(ExtractError::NoDocument)?;

        // Clear before running so a failure never leaves a stale result
        // from an earlier (possibly different-category) extraction visible.
        self.result = None;

        let output = extract_from_bytes(&document.bytes, category, config).await?;
        Ok(self.result.insert(output))
    }

    /// First-page preview PNG of the uploaded document.
    pub async fn preview(&self, config: &ExtractionConfig) -> Result<Vec<u8>, ExtractError> {
        let document = self.document.as_ref().ok_or(ExtractError::NoDocument)?;
        preview_from_bytes(&document.bytes, config).await
    }
}
