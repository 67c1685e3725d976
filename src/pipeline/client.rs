//! Extraction client: obtain raw model text for one document image.
//!
//! This layer is intentionally thin — prompt wording lives in
//! [`crate::prompts`], transport details in [`crate::boundary`] — so that
//! every failure mode of *obtaining* text is distinguishable here without
//! inspecting text content:
//!
//! * no credential      → [`ExtractError::MissingCredential`], before any
//!   boundary activity (including injected test boundaries)
//! * boundary failure   → [`ExtractError::Transport`] with the provider's
//!   message
//! * success, no text   → [`ExtractError::EmptyReply`]
//!
//! There is no retry loop: re-invocation is the caller's concern, and a
//! fresh call is idempotent with respect to pipeline state.

use crate::boundary::{BoundaryOptions, HttpBoundary, ModelBoundary};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::image::ImagePayload;
use crate::prompts;
use crate::schema::ExtractionSchema;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request one raw reply from the model boundary.
///
/// Returns the reply text unmodified — parsing happens downstream.
pub async fn request_reply(
    image: &ImagePayload,
    schema: &ExtractionSchema,
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    // Credential gate precedes boundary resolution: callers can assert that
    // a missing key produces zero transport calls.
    let credential = config
        .credential()
        .ok_or(ExtractError::MissingCredential)?;

    let boundary = resolve_boundary(credential, config)?;
    let prompt = prompts::extraction_prompt(schema);
    let options = BoundaryOptions {
        model: config.model.clone(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    debug!(
        "Requesting {} extraction from model '{}'",
        schema.kind, options.model
    );

    let reply = boundary
        .describe(&prompt, image, &options)
        .await
        .map_err(|e| {
            warn!("Boundary call failed: {}", e.message);
            ExtractError::Transport { message: e.message }
        })?;

    match reply.text {
        Some(text) if !text.trim().is_empty() => {
            debug!("Received {} bytes of reply text", text.len());
            Ok(text)
        }
        _ => Err(ExtractError::EmptyReply),
    }
}

/// Resolve the boundary: an injected one wins, otherwise the built-in
/// OpenAI-compatible HTTP boundary for `config.base_url`.
fn resolve_boundary(
    credential: &str,
    config: &ExtractionConfig,
) -> Result<Arc<dyn ModelBoundary>, ExtractError> {
    if let Some(ref boundary) = config.boundary {
        return Ok(Arc::clone(boundary));
    }
    Ok(Arc::new(HttpBoundary::new(
        credential,
        config.base_url.clone(),
        config.api_timeout_secs,
    )?))
}
