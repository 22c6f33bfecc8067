//! Tolerant parsing of the model reply into an [`EntityMap`].
//!
//! Models asked for "only the JSON object" still wrap it in prose often
//! enough that "parse raw text as JSON, else fail" throws away good answers.
//! The recovery ladder here is deliberately short:
//!
//! 1. parse the whole trimmed reply as JSON;
//! 2. otherwise scan for the first *balanced* top-level `{…}` substring
//!    (string- and escape-aware) and parse that;
//! 3. otherwise fail with [`ExtractError::ResponseParse`].
//!
//! The parsed object is then normalised against the requesting category:
//! keys outside the entity list are logged at debug and dropped, keys the
//! model omitted are back-filled with null, and scalar values are coerced to
//! strings. The result always carries exactly the category's four entities.

use crate::category::DocumentCategory;
use crate::error::ExtractError;
use crate::output::EntityMap;
use serde_json::Value;
use tracing::debug;

/// Parse a raw model reply into the category's entity mapping.
pub fn parse_entities(
    raw: &str,
    category: DocumentCategory,
) -> Result<EntityMap, ExtractError> {
    let value = parse_lenient(raw)?;

    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(ExtractError::ResponseParse {
                detail: format!("expected a JSON object, got {}", json_kind(&other)),
                raw: raw.to_string(),
            })
        }
    };

    let mut entities = EntityMap::new();
    for entity in category.entities() {
        let value = object.get(*entity).map(coerce_value).unwrap_or(None);
        entities.insert((*entity).to_string(), value);
    }

    // Keys the model invented are dropped, not shown; log them so a
    // misbehaving prompt is visible.
    for key in object.keys() {
        if !category.entities().contains(&key.as_str()) {
            debug!("Dropping unexpected entity key from model reply: {key:?}");
        }
    }

    Ok(entities)
}

/// Strict parse first, then first-balanced-object extraction.
fn parse_lenient(raw: &str) -> Result<Value, ExtractError> {
    let trimmed = raw.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => Ok(v),
        Err(strict_err) => match extract_first_json_object(trimmed) {
            Some(candidate) => serde_json::from_str::<Value>(candidate).map_err(|e| {
                ExtractError::ResponseParse {
                    detail: format!("embedded object is not valid JSON: {e}"),
                    raw: raw.to_string(),
                }
            }),
            None => Err(ExtractError::ResponseParse {
                detail: strict_err.to_string(),
                raw: raw.to_string(),
            }),
        },
    }
}

/// Find the first balanced top-level `{…}` substring.
///
/// Brace counting skips braces inside JSON strings and honours `\"` escapes,
/// so `{"Name": "a {weird} value"}` embedded in prose is still found whole.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Coerce one JSON value to the string-or-null the entity map carries.
///
/// Models occasionally return numbers ("Total Marks": 180) or small arrays;
/// stringifying beats rejecting the whole reply over a type quibble.
fn coerce_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(coerce_value)
                .collect::<Vec<_>>()
                .join(", ");
            if joined.is_empty() {
                None
            } else {
                Some(joined)
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
