//! Field normalisation: raw parse output → canonical typed values.
//!
//! Every schema field comes out of this stage present and typed — dates as
//! `YYYY-MM-DD` or the sentinel, amounts as numbers, enumerations within
//! their allowed set or the catch-all, confidence clamped to 0–100. The
//! stage is a fixed point: normalising an already-normalised record changes
//! nothing, so callers may safely re-run it.

use crate::pipeline::parse::RawExtraction;
use crate::result::{FieldValue, ParseTier};
use crate::schema::{ExtractionSchema, FieldKind, FieldSpec, UNKNOWN};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Normalised fields plus the final clamped confidence.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub fields: BTreeMap<String, FieldValue>,
    pub confidence: u8,
}

/// Normalise a raw extraction against its schema.
///
/// `heuristic_confidence` is the fixed confidence assigned when the
/// heuristic tier recovered at least one field; a heuristic pass that
/// recovered nothing scores 0.
pub fn normalize_fields(
    schema: &ExtractionSchema,
    raw: &RawExtraction,
    heuristic_confidence: u8,
) -> Normalized {
    let mut fields = BTreeMap::new();
    for spec in schema.fields {
        let value = match raw.values.get(spec.name) {
            Some(v) => normalize_value(spec, v),
            None => spec.default_value(),
        };
        fields.insert(spec.name.to_string(), value);
    }

    let confidence = match raw.tier {
        ParseTier::Strict => raw.confidence.map(clamp_confidence).unwrap_or(0),
        ParseTier::Heuristic => {
            if raw.values.is_empty() {
                0
            } else {
                heuristic_confidence.min(100)
            }
        }
    };

    Normalized { fields, confidence }
}

/// Clamp into 0–100; NaN and infinities score 0.
fn clamp_confidence(c: f64) -> u8 {
    if c.is_finite() {
        c.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn normalize_value(spec: &FieldSpec, raw: &Value) -> FieldValue {
    match spec.kind {
        FieldKind::Date => normalize_date(raw)
            .map(FieldValue::Text)
            .unwrap_or_else(|| spec.default_value()),
        FieldKind::Number => FieldValue::Number(coerce_number(raw).unwrap_or(0.0)),
        FieldKind::Enumerated | FieldKind::Text => resolved_text(raw)
            .map(FieldValue::Text)
            .unwrap_or_else(|| spec.default_value()),
    }
}

/// A usable text value: trimmed, non-empty, and not a case-variant of the
/// sentinel. Returning `None` routes the field to its canonical default, so
/// a model that answers `"unknown"` still yields the exact sentinel the
/// verification evaluator compares against.
fn resolved_text(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() || text.eq_ignore_ascii_case(UNKNOWN) {
        None
    } else {
        Some(text)
    }
}

// ── Dates ────────────────────────────────────────────────────────────────

static RE_ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Formats attempted in order. Month-first before day-first so `01/15/2025`
/// reads as January 15 (day-first only matches when the month-first read is
/// impossible). Two-digit-year forms come before `%Y` forms because `%Y`
/// also accepts short year strings.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Canonicalise to `YYYY-MM-DD`, or `None` when the value is not a date.
fn normalize_date(raw: &Value) -> Option<String> {
    let text = resolved_text(raw)?;

    // Already canonical: pass through unchanged.
    if RE_ISO_DATE.is_match(&text) {
        return Some(text);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

// ── Numbers ──────────────────────────────────────────────────────────────

/// Coerce to a number, tolerating currency symbols and thousands
/// separators (`$1,234.50` → 1234.5).
fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentKind, CATCH_ALL_CATEGORY};
    use serde_json::json;

    fn receipt() -> &'static ExtractionSchema {
        ExtractionSchema::for_kind(DocumentKind::Receipt)
    }

    fn strict_raw(values: &[(&str, Value)], confidence: Option<f64>) -> RawExtraction {
        RawExtraction {
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            confidence,
            tier: ParseTier::Strict,
        }
    }

    #[test]
    fn every_schema_field_is_present_after_normalisation() {
        let raw = strict_raw(&[("vendor", json!("Acme"))], Some(50.0));
        let n = normalize_fields(receipt(), &raw, 75);
        for spec in receipt().fields {
            assert!(n.fields.contains_key(spec.name), "missing '{}'", spec.name);
        }
    }

    #[test]
    fn unresolved_fields_take_schema_defaults() {
        let raw = strict_raw(&[], Some(10.0));
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["vendor"], FieldValue::Text(UNKNOWN.into()));
        assert_eq!(n.fields["amount"], FieldValue::Number(0.0));
        assert_eq!(
            n.fields["category"],
            FieldValue::Text(CATCH_ALL_CATEGORY.into())
        );
    }

    #[test]
    fn us_date_is_canonicalised() {
        let raw = strict_raw(&[("date", json!("01/15/2025"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["date"], FieldValue::Text("2025-01-15".into()));
    }

    #[test]
    fn iso_date_passes_through_unchanged() {
        let raw = strict_raw(&[("date", json!("2025-01-15"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["date"], FieldValue::Text("2025-01-15".into()));
    }

    #[test]
    fn written_out_dates_are_parsed() {
        for (input, expected) in [
            ("January 15, 2025", "2025-01-15"),
            ("Jan 15, 2025", "2025-01-15"),
            ("15 January 2025", "2025-01-15"),
            ("2025/01/15", "2025-01-15"),
        ] {
            let raw = strict_raw(&[("date", json!(input))], None);
            let n = normalize_fields(receipt(), &raw, 75);
            assert_eq!(
                n.fields["date"],
                FieldValue::Text(expected.into()),
                "input: {input}"
            );
        }
    }

    #[test]
    fn unparseable_date_becomes_the_sentinel_never_raw() {
        let raw = strict_raw(&[("date", json!("not-a-date"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["date"], FieldValue::Text(UNKNOWN.into()));
    }

    #[test]
    fn currency_strings_coerce_to_numbers() {
        for (input, expected) in [
            (json!("42.50"), 42.5),
            (json!("$1,234.50"), 1234.5),
            (json!(17), 17.0),
            (json!("€ 99.00"), 99.0),
        ] {
            let raw = strict_raw(&[("amount", input.clone())], None);
            let n = normalize_fields(receipt(), &raw, 75);
            assert_eq!(
                n.fields["amount"],
                FieldValue::Number(expected),
                "input: {input}"
            );
        }
    }

    #[test]
    fn uncoercible_amount_becomes_zero() {
        let raw = strict_raw(&[("amount", json!("a few dollars"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["amount"], FieldValue::Number(0.0));
    }

    #[test]
    fn lowercase_unknown_maps_to_the_canonical_sentinel() {
        let raw = strict_raw(&[("vendor", json!("unknown"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.fields["vendor"], FieldValue::Text(UNKNOWN.into()));
    }

    #[test]
    fn confidence_is_clamped_not_rejected() {
        for (reported, expected) in [(250.0, 100), (-5.0, 0), (95.4, 95), (f64::NAN, 0)] {
            let raw = strict_raw(&[], Some(reported));
            let n = normalize_fields(receipt(), &raw, 75);
            assert_eq!(n.confidence, expected, "reported: {reported}");
        }
    }

    #[test]
    fn missing_strict_confidence_scores_zero() {
        let raw = strict_raw(&[("vendor", json!("Acme"))], None);
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.confidence, 0);
    }

    #[test]
    fn heuristic_tier_scores_the_fixed_default_when_fields_resolved() {
        let raw = RawExtraction {
            values: [("amount".to_string(), json!("42.50"))].into_iter().collect(),
            confidence: None,
            tier: ParseTier::Heuristic,
        };
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.confidence, 75);
    }

    #[test]
    fn heuristic_tier_with_nothing_recovered_scores_zero() {
        let raw = RawExtraction {
            values: BTreeMap::new(),
            confidence: None,
            tier: ParseTier::Heuristic,
        };
        let n = normalize_fields(receipt(), &raw, 75);
        assert_eq!(n.confidence, 0);
    }

    #[test]
    fn normalisation_is_a_fixed_point() {
        let raw = strict_raw(
            &[
                ("vendor", json!("  Acme Hardware  ")),
                ("amount", json!("$42.50")),
                ("date", json!("01/15/2025")),
                ("category", json!("Meals")),
            ],
            Some(88.0),
        );
        let first = normalize_fields(receipt(), &raw, 75);

        // Feed the normalised output back in as raw values.
        let again = RawExtraction {
            values: first
                .fields
                .iter()
                .map(|(k, v)| {
                    let raw = match v {
                        FieldValue::Number(n) => json!(n),
                        FieldValue::Text(s) => json!(s),
                    };
                    (k.clone(), raw)
                })
                .collect(),
            confidence: Some(first.confidence as f64),
            tier: ParseTier::Strict,
        };
        let second = normalize_fields(receipt(), &again, 75);

        assert_eq!(first.fields, second.fields);
        assert_eq!(first.confidence, second.confidence);
    }
}
