//! Dictionary entry types and their construction-time validation.
//!
//! Every entry arrives as a loosely-typed "document" (the JSON shape clients
//! send and the store keeps) and is turned into its validated form with
//! `TryFrom`. Validated values cannot hold an invalid field combination.
//!
//! - `root`: morphological roots and their inflection modes
//! - `translation`: lexical entries keyed on part of speech

mod root;
mod translation;

use std::fmt;

use thiserror::Error;

pub use root::{ModeData, ModeFields, ModeForms, Modes, Root, RootDocument, RootPatch};
pub use translation::{
    Category, NounFields, NounType, PartOfSpeech, Translation, TranslationDocument,
    TranslationPatch, VerbFields,
};

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("mode.{0} must have at least one non-empty field")]
    EmptyMode(&'static str),

    #[error("{field} {} required when category is '{category}'", copula(.field))]
    Required {
        field: &'static str,
        category: PartOfSpeech,
    },

    #[error("{field} should only be set when category is '{category}'")]
    Forbidden {
        field: &'static str,
        category: PartOfSpeech,
    },
}

/// Payload groups read as plurals: "noun_fields are required".
fn copula(field: &str) -> &'static str {
    if field.ends_with("_fields") {
        "are"
    } else {
        "is"
    }
}

/// Rejection of an entry, listing every rule it breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Treat `""` the same as a missing value.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
