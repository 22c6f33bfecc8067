//! Document categories and their fixed entity lists.
//!
//! A category selects which four named fields the extractor asks the model
//! for, and which human-readable labels the shell uses to render them. Both
//! sides come from the *same* category value: the category is bound to the
//! result at request time (see [`crate::output::ExtractionOutput`]), so a
//! selector changed mid-flight can never mismatch entity keys and labels.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed document kind selecting which entities to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    /// An academic marksheet / grade report.
    Marksheet,
    /// A job offer letter.
    OfferLetter,
}

impl DocumentCategory {
    /// All supported categories, in selector order.
    pub const ALL: [DocumentCategory; 2] =
        [DocumentCategory::Marksheet, DocumentCategory::OfferLetter];

    /// The entity names requested from the model for this category.
    ///
    /// These exact strings appear as keys in the instruction block and in the
    /// extraction result; changing one is a breaking change for downstream
    /// consumers of the JSON artifact.
    pub fn entities(&self) -> &'static [&'static str; 4] {
        match self {
            DocumentCategory::Marksheet => {
                &["Name", "Mothers Name", "Subject Names", "Total Marks"]
            }
            DocumentCategory::OfferLetter => {
                &["Name", "Organisation Name", "Date", "Designation"]
            }
        }
    }

    /// Human-readable display label for one of this category's entities.
    ///
    /// Returns `None` for entity names outside the category's list.
    pub fn label(&self, entity: &str) -> Option<&'static str> {
        match self {
            DocumentCategory::Marksheet => match entity {
                "Name" => Some("Student Name"),
                "Mothers Name" => Some("Mother's Name"),
                "Subject Names" => Some("Subjects"),
                "Total Marks" => Some("Total Marks"),
                _ => None,
            },
            DocumentCategory::OfferLetter => match entity {
                "Name" => Some("Candidate Name"),
                "Organisation Name" => Some("Organization"),
                "Date" => Some("Date"),
                "Designation" => Some("Designation"),
                _ => None,
            },
        }
    }

    /// Filesystem-safe identifier, used in the artifact filename
    /// `extracted_entities_<slug>.json`.
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentCategory::Marksheet => "marksheet",
            DocumentCategory::OfferLetter => "offer_letter",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentCategory::Marksheet => write!(f, "marksheet"),
            DocumentCategory::OfferLetter => write!(f, "offer letter"),
        }
    }
}

impl FromStr for DocumentCategory {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "marksheet" => Ok(DocumentCategory::Marksheet),
            "offer letter" | "offer-letter" | "offer_letter" | "offerletter" => {
                Ok(DocumentCategory::OfferLetter)
            }
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown document category '{other}' (expected 'marksheet' or 'offer-letter')"
            ))),
        }
    }
}
