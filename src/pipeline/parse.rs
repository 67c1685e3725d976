//! Response parsing: strict structured tier, then heuristic line tier.
//!
//! The model is *prompted* to emit a bare JSON object but is not guaranteed
//! to comply — replies arrive wrapped in prose, fenced in markdown, or
//! truncated mid-object. The strict tier optimises for the well-behaved
//! case: take the first `{` through the last `}` and decode it. When that
//! yields nothing decodable, the heuristic tier scans individual lines for
//! field aliases so a *mostly* useful reply still produces a record.
//!
//! This two-tier fallback is the load-bearing decision of the whole crate:
//! parsing never fails. A reply that defeats both tiers produces an empty
//! extraction, which the normaliser turns into schema defaults with
//! confidence 0 — callers always get a result to show, edit, or discard.

use crate::result::ParseTier;
use crate::schema::ExtractionSchema;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw parse output: resolved fields (absent = unresolved), the unclamped
/// model-reported confidence, and which tier produced them.
#[derive(Debug, Clone)]
pub struct RawExtraction {
    pub values: BTreeMap<String, Value>,
    pub confidence: Option<f64>,
    pub tier: ParseTier,
}

/// Parse one raw reply against a schema. Total: never errors.
pub fn parse_reply(schema: &ExtractionSchema, text: &str) -> RawExtraction {
    if let Some(candidate) = brace_substring(text) {
        if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate) {
            return strict_extract(schema, &object);
        }
    }
    heuristic_extract(schema, text)
}

/// The first `{` through the last `}` — the widest plausible object span.
///
/// Markdown fences and surrounding prose fall away for free: they sit
/// outside the braces.
fn brace_substring(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ── Strict tier ──────────────────────────────────────────────────────────

fn strict_extract(
    schema: &ExtractionSchema,
    object: &serde_json::Map<String, Value>,
) -> RawExtraction {
    let mut values = BTreeMap::new();
    for field in schema.fields {
        // A field the model omitted (or nulled) is unresolved, not an error.
        match object.get(field.name) {
            Some(Value::Null) | None => {}
            Some(v) => {
                values.insert(field.name.to_string(), v.clone());
            }
        }
    }
    let confidence = object.get("confidence").and_then(numeric);
    RawExtraction {
        values,
        confidence,
        tier: ParseTier::Strict,
    }
}

/// Read a confidence value the model may have emitted as a number, a
/// numeric string, or a percentage string.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

// ── Heuristic tier ───────────────────────────────────────────────────────

fn heuristic_extract(schema: &ExtractionSchema, text: &str) -> RawExtraction {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut values = BTreeMap::new();
    for field in schema.fields {
        if let Some(found) = scan_lines(&lines, field.aliases) {
            values.insert(field.name.to_string(), Value::String(found));
        }
    }

    // No model-reported confidence exists on this path; the fixed
    // heuristic default is applied downstream by the normaliser.
    RawExtraction {
        values,
        confidence: None,
        tier: ParseTier::Heuristic,
    }
}

/// First line containing any alias (case-insensitive) that also carries a
/// `key: value` or `key = value` shape.
fn scan_lines(lines: &[&str], aliases: &[&str]) -> Option<String> {
    for line in lines {
        let lower = line.to_lowercase();
        if aliases.iter().any(|alias| lower.contains(alias)) {
            if let Some(value) = value_after_separator(line) {
                return Some(value);
            }
        }
    }
    None
}

/// The substring after the first `:` or `=`, trimmed and unquoted.
fn value_after_separator(line: &str) -> Option<String> {
    let idx = line.find([':', '='])?;
    let value = line[idx + 1..]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}
