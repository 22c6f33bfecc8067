//! Output types: the extraction result, its stats, and the JSON artifact.

use crate::category::DocumentCategory;
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Entity name → extracted value, `None` when the document does not carry it.
///
/// Keys are always exactly the requesting category's entity list: the parser
/// drops anything the model invented and back-fills nulls for anything it
/// omitted, so consumers can index by entity name without existence checks.
pub type EntityMap = BTreeMap<String, Option<String>>;

/// The result of one extraction run.
///
/// The category is bound here at request time. Rendering labels and the
/// artifact filename both read it from the result, never from whatever the
/// UI's category selector happens to say afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Category the extraction was requested with.
    pub category: DocumentCategory,
    /// Extracted entity values.
    pub entities: EntityMap,
    /// Full recognised text the extractor saw (page-numbered concatenation).
    pub recognized_text: String,
    /// Timing and page statistics.
    pub stats: ExtractionStats,
}

/// Statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document (all are processed, in order).
    pub total_pages: usize,
    /// Pages whose OCR failed and contributed an empty-text page.
    pub empty_ocr_pages: usize,
    /// Wall-clock time spent rasterising.
    pub render_duration_ms: u64,
    /// Wall-clock time spent in the OCR engine.
    pub ocr_duration_ms: u64,
    /// Wall-clock time spent in the completion call, including retries.
    pub llm_duration_ms: u64,
    /// Total wall-clock time.
    pub total_duration_ms: u64,
    /// Completion retries that were actually taken.
    pub retries: u32,
}

impl ExtractionOutput {
    /// Conventional artifact filename: `extracted_entities_<category>.json`.
    pub fn artifact_filename(&self) -> String {
        format!("extracted_entities_{}.json", self.category.slug())
    }

    /// Pretty-printed JSON artifact body (UTF-8, entity map only).
    ///
    /// The downloadable artifact is the flat entity mapping, not the full
    /// output struct.
    pub fn to_artifact_json(&self) -> String {
        // EntityMap serialisation cannot fail: string keys, string/null values.
        serde_json::to_string_pretty(&self.entities)
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Write the JSON artifact to `path` (atomically: temp file + rename).
    pub fn write_artifact(&self, path: impl AsRef<Path>) -> Result<PathBuf, ExtractError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ExtractError::OutputWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, self.to_artifact_json()).map_err(|e| {
            ExtractError::OutputWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| ExtractError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(path.to_path_buf())
    }

    /// Render the labelled report shown in the results pane.
    ///
    /// One line per entity, in the category's declared order, with display
    /// labels from the bound category and "Not found" for nulls.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        for entity in self.category.entities() {
            let label = self.category.label(entity).unwrap_or(entity);
            let value = self
                .entities
                .get(*entity)
                .and_then(|v| v.as_deref())
                .unwrap_or("Not found");
            let _ = writeln!(out, "{label}: {value}");
        }
        out
    }
}
