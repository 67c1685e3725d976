//! Verification: derive the advisory trust flag.
//!
//! A result is verified when the model's confidence clears the configured
//! threshold (exclusive — 70 means "71 and up") *and* every required field
//! resolved to something other than the `"Unknown"` sentinel. The flag is
//! advisory only: it signals that manual review is probably unnecessary,
//! and blocks nothing downstream.

use crate::result::FieldValue;
use crate::schema::ExtractionSchema;
use std::collections::BTreeMap;

/// Evaluate the trust flag for a normalised field set.
pub fn evaluate(
    schema: &ExtractionSchema,
    fields: &BTreeMap<String, FieldValue>,
    confidence: u8,
    threshold: u8,
) -> bool {
    if confidence <= threshold {
        return false;
    }
    schema.required_fields().all(|spec| {
        fields
            .get(spec.name)
            .map(|value| !value.is_unresolved())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentKind, UNKNOWN};

    fn resolved_receipt_fields() -> BTreeMap<String, FieldValue> {
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        schema
            .fields
            .iter()
            .map(|f| {
                let value = match f.name {
                    "amount" => FieldValue::Number(42.5),
                    "date" => FieldValue::Text("2025-01-15".into()),
                    _ => FieldValue::Text("resolved".into()),
                };
                (f.name.to_string(), value)
            })
            .collect()
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        let fields = resolved_receipt_fields();
        assert!(evaluate(schema, &fields, 71, 70));
        assert!(!evaluate(schema, &fields, 70, 70));
    }

    #[test]
    fn unresolved_required_field_blocks_verification() {
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        let mut fields = resolved_receipt_fields();
        fields.insert("vendor".to_string(), FieldValue::Text(UNKNOWN.into()));
        assert!(!evaluate(schema, &fields, 99, 70));
    }

    #[test]
    fn unresolved_optional_field_does_not_block() {
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        let mut fields = resolved_receipt_fields();
        fields.insert("description".to_string(), FieldValue::Text(UNKNOWN.into()));
        assert!(evaluate(schema, &fields, 90, 70));
    }

    #[test]
    fn defaulted_numeric_required_field_does_not_block() {
        // A required numeric field that fell back to its 0 default is not
        // the "Unknown" sentinel and therefore does not veto the flag.
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        let mut fields = resolved_receipt_fields();
        fields.insert("amount".to_string(), FieldValue::Number(0.0));
        assert!(evaluate(schema, &fields, 90, 70));
    }

    #[test]
    fn missing_required_entry_blocks_verification() {
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        let mut fields = resolved_receipt_fields();
        fields.remove("date");
        assert!(!evaluate(schema, &fields, 99, 70));
    }
}
