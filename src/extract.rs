//! Extraction entry points: one call per document image.
//!
//! [`extract`] composes the pipeline stages in strict sequence. Failures to
//! *obtain* text (unreadable image, missing credential, boundary failure,
//! empty reply) surface immediately as [`ExtractError`]; once text is in
//! hand, parsing, normalisation, and verification cannot fail — a poor
//! reply degrades to sentinel defaults and low confidence instead.
//!
//! Each call is independent and stateless, so callers may run any number
//! concurrently; [`extract_batch`] does exactly that for a queue of images.
//! Retry, timeout, and cancellation policy belong to the caller — simply
//! re-invoke with the same or a re-captured image.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::{client, image, normalize, parse, verify};
use crate::pipeline::image::ImageInput;
use crate::result::ExtractionResult;
use crate::schema::{DocumentKind, ExtractionSchema};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info};

/// Extract a structured record from one document image.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `kind`   — Which extraction schema to apply
/// * `input`  — Image bytes, an encoded string, or a file path
/// * `config` — Extraction configuration
///
/// # Errors
/// Returns `Err(ExtractError)` only when no model text could be obtained:
/// - `MissingCredential` — no API key configured (checked before any
///   network activity)
/// - `ImageRead` / `InvalidImageInput` — the image could not be normalised
/// - `Transport` — the boundary reported failure
/// - `EmptyReply` — the boundary returned no usable text
pub async fn extract(
    kind: DocumentKind,
    input: impl Into<ImageInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let start = Instant::now();

    // ── Step 1: Normalise the image ──────────────────────────────────────
    let payload = image::normalize_image(input.into())?;

    // ── Step 2: Look up the schema ───────────────────────────────────────
    let schema = ExtractionSchema::for_kind(kind);
    debug!("Extracting {} ({} fields)", kind, schema.fields.len());

    // ── Step 3: Obtain raw text from the boundary ────────────────────────
    let raw_text = client::request_reply(&payload, schema, config).await?;

    // ── Step 4: Parse (never fails) ──────────────────────────────────────
    let raw = parse::parse_reply(schema, &raw_text);

    // ── Step 5: Normalise fields and confidence ──────────────────────────
    let normalized = normalize::normalize_fields(schema, &raw, config.heuristic_confidence);

    // ── Step 6: Derive the trust flag ────────────────────────────────────
    let verified = verify::evaluate(
        schema,
        &normalized.fields,
        normalized.confidence,
        config.verify_threshold,
    );

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "{} extraction done: confidence {}, verified {}, {:?} tier, {}ms",
        kind, normalized.confidence, verified, raw.tier, duration_ms
    );

    Ok(ExtractionResult {
        kind,
        fields: normalized.fields,
        confidence: normalized.confidence,
        verified,
        raw_text,
        tier: raw.tier,
        duration_ms,
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    kind: DocumentKind,
    input: impl Into<ImageInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(kind, input, config))
}

/// Extract a queue of images of the same kind concurrently.
///
/// Runs up to `config.batch_concurrency` boundary calls at once. Results
/// come back in input order, and one image's failure never aborts its
/// siblings — each entry is its own `Result`.
pub async fn extract_batch(
    kind: DocumentKind,
    inputs: Vec<ImageInput>,
    config: &ExtractionConfig,
) -> Vec<Result<ExtractionResult, ExtractError>> {
    let concurrency = config.batch_concurrency.max(1);
    stream::iter(inputs)
        .map(|input| extract(kind, input, config))
        .buffered(concurrency)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryError, BoundaryOptions, BoundaryReply, ModelBoundary};
    use crate::pipeline::image::ImagePayload;
    use crate::result::{FieldValue, ParseTier};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedReply(String);

    #[async_trait]
    impl ModelBoundary for FixedReply {
        async fn describe(
            &self,
            _prompt: &str,
            _image: &ImagePayload,
            _options: &BoundaryOptions,
        ) -> Result<BoundaryReply, BoundaryError> {
            Ok(BoundaryReply {
                text: Some(self.0.clone()),
            })
        }
    }

    fn config_replying(text: &str) -> ExtractionConfig {
        ExtractionConfig::builder()
            .api_key("test-key")
            .boundary(Arc::new(FixedReply(text.to_string())))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn garbage_reply_still_yields_a_full_result() {
        let config = config_replying("I cannot make out this image, apologies.");
        let result = extract(DocumentKind::Receipt, "QUJD", &config).await.unwrap();

        assert_eq!(result.tier, ParseTier::Heuristic);
        assert_eq!(result.confidence, 0);
        assert!(!result.verified);
        let schema = ExtractionSchema::for_kind(DocumentKind::Receipt);
        assert_eq!(result.fields.len(), schema.fields.len());
    }

    #[tokio::test]
    async fn raw_text_is_retained_verbatim() {
        let reply = "fences:\n```json\n{\"vendor\":\"Acme\",\"confidence\":90}\n```";
        let config = config_replying(reply);
        let result = extract(DocumentKind::Receipt, "QUJD", &config).await.unwrap();
        assert_eq!(result.raw_text, reply);
        assert_eq!(
            result.field("vendor"),
            Some(&FieldValue::Text("Acme".into()))
        );
    }

    #[tokio::test]
    async fn batch_preserves_input_order_and_isolates_failures() {
        let config = config_replying(r#"{"vendor":"Acme","confidence":50}"#);
        let inputs = vec![
            ImageInput::Encoded("QUJD".into()),
            ImageInput::Encoded(String::new()), // fails image normalisation
            ImageInput::Encoded("REVG".into()),
        ];
        let results = extract_batch(DocumentKind::Receipt, inputs, &config).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ExtractError::InvalidImageInput { .. })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn extract_sync_matches_async_behaviour() {
        let config = config_replying(r#"{"vendor":"Acme","confidence":42}"#);
        let result = extract_sync(DocumentKind::Receipt, "QUJD", &config).unwrap();
        assert_eq!(result.confidence, 42);
    }
}
