//! Extraction prompts, rendered per schema.
//!
//! Centralising prompt construction here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON shape the model is asked for is
//!    generated from the same [`ExtractionSchema`] the parser and normaliser
//!    read, so the prompt cannot drift from the code that consumes replies.
//!
//! 2. **Testability** — unit tests inspect rendered prompts directly without
//!    a live model, so a field rename that breaks the contract fails fast.
//!
//! The `"Unknown"` instruction is the contract the whole downstream pipeline
//! rests on: the normaliser substitutes it and the verification evaluator
//! compares against it, all via [`crate::schema::UNKNOWN`].

use crate::schema::{ExtractionSchema, FieldKind, UNKNOWN};

/// Render the extraction prompt for one schema.
pub fn extraction_prompt(schema: &ExtractionSchema) -> String {
    let mut field_lines = String::new();
    for f in schema.fields {
        field_lines.push_str(&format!("   - \"{}\": {}\n", f.name, f.hint));
    }

    let mut extras = String::new();
    if !schema.enumerated_values.is_empty() {
        extras.push_str(&format!(
            "\n3. CATEGORIES\n   Allowed category values: {}.\n   Pick the closest match; \
             use \"{}\" when none fits.\n",
            schema.enumerated_values.join(", "),
            crate::schema::CATCH_ALL_CATEGORY
        ));
    }

    let date_note = if schema
        .fields
        .iter()
        .any(|f| matches!(f.kind, FieldKind::Date))
    {
        "\n   Format all dates as YYYY-MM-DD."
    } else {
        ""
    };

    format!(
        r#"You are an expert document analyst. Examine this photograph of a {label} and extract the fields below.

1. FIELDS
{field_lines}
2. OUTPUT FORMAT
   Respond with a single JSON object and nothing else — no commentary, no markdown fences.
   The object must contain exactly these keys: {key_list}, plus "confidence".
   "confidence" is an integer from 0 to 100 expressing how certain you are of the extraction overall.
   Use the string "{unknown}" for any field you cannot determine.{date_note}
{extras}"#,
        label = schema.label,
        field_lines = field_lines,
        key_list = key_list(schema),
        unknown = UNKNOWN,
        date_note = date_note,
        extras = extras,
    )
}

fn key_list(schema: &ExtractionSchema) -> String {
    schema
        .fields
        .iter()
        .map(|f| format!("\"{}\"", f.name))
        .collect::<Vec<_>>()
        .join(", ")
}
