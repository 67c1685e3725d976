//! Extraction schemas: what to pull out of each kind of document.
//!
//! The whole pipeline is parameterised by an [`ExtractionSchema`] value, so
//! adding a new document kind is a data change here — no other component
//! needs to know it exists. Each schema lists its fields in the order the
//! prompt presents them, marks which are required for verification, and
//! carries the lowercase aliases the heuristic parse tier scans for when the
//! model's reply is not well-formed JSON.
//!
//! The `"Unknown"` sentinel is load-bearing: the prompt tells the model to
//! emit it for undeterminable fields, the normaliser substitutes it for
//! unresolvable ones, and the verification evaluator compares against it.
//! All three sites reference [`UNKNOWN`] so they cannot drift apart.

use crate::result::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel emitted by the model (per the prompt) and substituted by the
/// normaliser for any field that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Catch-all value for enumerated fields with no usable resolution.
pub const CATCH_ALL_CATEGORY: &str = "Other";

/// Expense categories offered to the model for receipt classification.
pub const RECEIPT_CATEGORIES: &[&str] = &[
    "Office Supplies",
    "Travel",
    "Meals",
    "Fuel",
    "Postage",
    "Professional Services",
    "Other",
];

/// Which extraction schema applies to a document image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// A financial receipt (store purchase, fuel, meal, ...).
    Receipt,
    /// An identity document (driver license, passport, state ID, ...).
    Identity,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Receipt => write!(f, "receipt"),
            DocumentKind::Identity => write!(f, "identity"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" => Ok(DocumentKind::Receipt),
            "identity" | "id" => Ok(DocumentKind::Identity),
            _ => Err(format!(
                "unknown document kind '{s}'. Valid options: receipt, identity"
            )),
        }
    }
}

/// How a field's raw value is normalised and defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Canonicalised to `YYYY-MM-DD`, or the [`UNKNOWN`] sentinel.
    Date,
    /// Coerced to a number; `0` when coercion fails.
    Number,
    /// Passed through, defaulting to [`CATCH_ALL_CATEGORY`] when unresolved.
    Enumerated,
    /// Trimmed free text, defaulting to [`UNKNOWN`] when unresolved.
    Text,
}

/// One field in an extraction schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name — also the JSON key the prompt asks the model to emit.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields gate the `verified` flag; see
    /// [`crate::pipeline::verify`].
    pub required: bool,
    /// Lowercase substrings the heuristic parse tier scans lines for.
    /// Always includes the field name itself.
    pub aliases: &'static [&'static str],
    /// One-line guidance rendered into the extraction prompt.
    pub hint: &'static str,
}

impl FieldSpec {
    /// The value substituted when this field cannot be resolved.
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Number => FieldValue::Number(0.0),
            FieldKind::Enumerated => FieldValue::Text(CATCH_ALL_CATEGORY.to_string()),
            FieldKind::Date | FieldKind::Text => FieldValue::Text(UNKNOWN.to_string()),
        }
    }
}

/// The field list and prompt framing for one document kind.
///
/// Immutable; defined once per kind in the static tables below.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    pub kind: DocumentKind,
    /// Human phrasing used in the prompt ("financial receipt", ...).
    pub label: &'static str,
    /// Fields in prompt order.
    pub fields: &'static [FieldSpec],
    /// Allowed values for the schema's enumerated field, if it has one.
    pub enumerated_values: &'static [&'static str],
}

impl ExtractionSchema {
    /// Pure lookup from kind to schema.
    pub fn for_kind(kind: DocumentKind) -> &'static ExtractionSchema {
        match kind {
            DocumentKind::Receipt => &RECEIPT,
            DocumentKind::Identity => &IDENTITY,
        }
    }

    /// Find a field spec by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The fields whose resolution gates verification.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

// ── Shipped schemas ──────────────────────────────────────────────────────

static RECEIPT: ExtractionSchema = ExtractionSchema {
    kind: DocumentKind::Receipt,
    label: "financial receipt",
    fields: &[
        FieldSpec {
            name: "vendor",
            kind: FieldKind::Text,
            required: true,
            aliases: &["vendor", "merchant", "store", "business", "payee"],
            hint: "the business name printed at the top of the receipt",
        },
        FieldSpec {
            name: "amount",
            kind: FieldKind::Number,
            required: true,
            aliases: &["amount", "total", "sum", "price", "paid"],
            hint: "the final total paid, as a plain decimal number with no currency symbol",
        },
        FieldSpec {
            name: "date",
            kind: FieldKind::Date,
            required: true,
            aliases: &["date"],
            hint: "the transaction date in YYYY-MM-DD form",
        },
        FieldSpec {
            name: "description",
            kind: FieldKind::Text,
            required: false,
            aliases: &["description", "details", "memo", "items"],
            hint: "a short summary of what was purchased",
        },
        FieldSpec {
            name: "category",
            kind: FieldKind::Enumerated,
            required: false,
            aliases: &["category", "classification"],
            hint: "the expense category, chosen from the allowed list",
        },
        FieldSpec {
            name: "payment_method",
            kind: FieldKind::Text,
            required: false,
            aliases: &["payment", "method", "card", "tender"],
            hint: "how the purchase was paid (e.g. Visa ending 1234, cash)",
        },
    ],
    enumerated_values: RECEIPT_CATEGORIES,
};

static IDENTITY: ExtractionSchema = ExtractionSchema {
    kind: DocumentKind::Identity,
    label: "identity document",
    fields: &[
        FieldSpec {
            name: "document_type",
            kind: FieldKind::Text,
            required: true,
            aliases: &["document_type", "document type", "type"],
            hint: "the kind of identity document (e.g. Driver License, Passport)",
        },
        FieldSpec {
            name: "document_number",
            kind: FieldKind::Text,
            required: true,
            aliases: &[
                "document_number",
                "document number",
                "number",
                "license",
                "passport",
            ],
            hint: "the document's identifying number, exactly as printed",
        },
        FieldSpec {
            name: "full_name",
            kind: FieldKind::Text,
            required: true,
            aliases: &["full_name", "full name", "name", "holder"],
            hint: "the holder's full legal name",
        },
        FieldSpec {
            name: "address",
            kind: FieldKind::Text,
            required: false,
            aliases: &["address", "residence"],
            hint: "the holder's address as printed, on one line",
        },
        FieldSpec {
            name: "date_of_birth",
            kind: FieldKind::Date,
            required: false,
            aliases: &["date_of_birth", "date of birth", "birth", "dob"],
            hint: "the holder's date of birth in YYYY-MM-DD form",
        },
        FieldSpec {
            name: "expiration_date",
            kind: FieldKind::Date,
            required: false,
            aliases: &[
                "expiration_date",
                "expiration",
                "expiry",
                "expires",
                "valid until",
            ],
            hint: "the document's expiration date in YYYY-MM-DD form",
        },
    ],
    enumerated_values: &[],
};
