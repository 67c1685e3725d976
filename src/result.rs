//! Output types for one extraction run.
//!
//! An [`ExtractionResult`] is created fresh on every
//! [`crate::extract::extract`] call and handed to the caller; the pipeline
//! never persists or mutates it afterward. Retry is the caller re-invoking
//! the pipeline, not editing a prior result. All types serialise to JSON so
//! callers can log, store, or ship results without conversion.

use crate::schema::{DocumentKind, UNKNOWN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A normalised field value: free text, a date-string, or a number.
///
/// Untagged so results serialise the way callers expect:
/// `{"amount": 42.5, "vendor": "Acme Hardware"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// True when the value is the `"Unknown"` sentinel.
    ///
    /// Numbers are never unresolved in this sense — a numeric field that
    /// failed coercion holds its `0` default, which does not block
    /// verification.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s == UNKNOWN)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Which parse tier produced the field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    /// A brace-delimited JSON object was found and decoded.
    Strict,
    /// Line-by-line alias scanning; used when no decodable object exists.
    Heuristic,
}

/// The outcome of one extraction pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The schema this result was extracted under.
    pub kind: DocumentKind,

    /// Every field the schema declares, always present — unresolved fields
    /// hold their schema default, never null.
    pub fields: BTreeMap<String, FieldValue>,

    /// Model-reported (strict tier) or fixed (heuristic tier) confidence,
    /// clamped to 0–100.
    pub confidence: u8,

    /// Advisory trust flag derived from confidence and required-field
    /// presence. Never set by the model or the user.
    pub verified: bool,

    /// The boundary's reply, unmodified. Retained for audit and for
    /// retry-without-recall flows.
    pub raw_text: String,

    /// Which parse tier produced `fields`.
    pub tier: ParseTier,

    /// Wall-clock duration of the whole pipeline run.
    pub duration_ms: u64,
}

impl ExtractionResult {
    /// Convenience accessor for a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
