//! Prompts for LLM-based entity extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: tightening a formatting rule or adding a
//!    new one requires editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the built instruction block
//!    directly without a live model, so prompt regressions are caught cheap.
//!
//! Callers can override the system prompt via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

use crate::category::DocumentCategory;

/// Default system prompt for entity extraction.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI Assistant that extracts structured information from given documents";

/// Build the user instruction block for one extraction request.
///
/// The block embeds the category's entity names, the full recognised text,
/// and the formatting rules the parser depends on: one JSON object, exactly
/// the listed keys, null for absent values, dates in `MM-DD-YYYY`, nothing
/// outside the object. Models still wrap the object in prose sometimes;
/// [`crate::pipeline::parse`] tolerates that, but asking first keeps the
/// tolerant path rare.
pub fn build_extraction_prompt(category: DocumentCategory, recognized_text: &str) -> String {
    let entities = category
        .entities()
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Extract the following entities from the given text:

Entities: [{entities}]
Text: {recognized_text}

Instructions:
1. Read the full text and extract the most relevant value for each entity.
2. The output MUST be a valid JSON object.
3. The JSON MUST contain ONLY the entities as keys and their extracted values as strings.
4. If an entity is not found in the text, set its value to null.
5. The final answer MUST be only the JSON object and nothing else.
6. Do NOT add explanations, comments, extra fields, or text outside the JSON.
7. Do NOT give any notes.
8. Do NOT mention any extra characters in the result.
9. Date should always be in "MM-DD-YYYY" format.
"#
    )
}
