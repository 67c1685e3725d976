//! Error types for the docintel library.
//!
//! Only failures to *obtain* model text are errors. Everything that can go
//! wrong while *interpreting* text — malformed JSON, missing fields, junk
//! confidence values — is absorbed into the returned
//! [`crate::result::ExtractionResult`] as low confidence and sentinel
//! defaults. There is deliberately no parse-error variant: a degraded
//! low-confidence record is always more useful to the caller than an
//! exception, because the caller can still offer manual entry pre-filled
//! with whatever was recovered.
//!
//! The call-time variants map one-to-one onto the caller's recovery paths:
//! [`ExtractError::MissingCredential`] → configure and retry process-wide,
//! [`ExtractError::ImageRead`] / [`ExtractError::InvalidImageInput`] →
//! prompt for a different image, [`ExtractError::Transport`] /
//! [`ExtractError::EmptyReply`] → offer a retry.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docintel library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API credential is configured. Checked before any network activity.
    #[error(
        "No API credential configured.\n\
         Set DOCINTEL_API_KEY (or OPENAI_API_KEY), or pass one with \
         ExtractionConfig::builder().api_key(...)."
    )]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// The image file could not be read.
    #[error("Failed to read image file '{path}': {source}\nCheck the path exists and is readable.")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image input could not be turned into a base64 payload.
    #[error("Invalid image input: {detail}")]
    InvalidImageInput { detail: String },

    // ── Boundary errors ───────────────────────────────────────────────────
    /// The model boundary was reached but reported failure.
    #[error("Model boundary reported failure: {message}")]
    Transport { message: String },

    /// The boundary call succeeded but the reply envelope held no text.
    #[error("Model reply contained no text content.\nRetry, or try a clearer photograph.")]
    EmptyReply,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
