//! Configuration for the extraction pipeline.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. The credential is read exactly once, when
//! the config is constructed — there is no hidden module-level state, so two
//! configs with different keys can coexist in one process (useful for
//! multi-tenant callers and for tests).
//!
//! # Design choice: builder over constructor
//! Callers set only what they care about and rely on documented defaults
//! for the rest; adding a knob never breaks an existing call site.

use crate::boundary::ModelBoundary;
use crate::error::ExtractError;
use std::fmt;
use std::sync::Arc;

/// Configuration for document extraction.
///
/// Built via [`ExtractionConfig::builder()`], [`ExtractionConfig::from_env()`],
/// or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use docintel::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("sk-...")
///     .model("gpt-4o-mini")
///     .verify_threshold(70)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// API credential for the model boundary. Absence is a hard
    /// [`ExtractError::MissingCredential`] on first use, not a silent no-op.
    pub api_key: Option<String>,

    /// Model identifier sent to the boundary. Default: "gpt-4o-mini".
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint used by the default
    /// boundary. Default: "https://api.openai.com/v1".
    pub base_url: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// document — exactly what you want for transcription-style extraction.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// A structured record for either shipped schema fits well under 300
    /// tokens; the headroom covers models that pad replies with prose.
    pub max_tokens: usize,

    /// Per-call timeout for the default boundary, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Confidence above which a result may be marked verified (exclusive
    /// boundary: 70 means "71 and up"). Default: 70.
    pub verify_threshold: u8,

    /// Confidence assigned when only the heuristic parse tier recovered
    /// fields and no model-reported confidence exists. Default: 75.
    ///
    /// Deliberately a conservative mid-range value, and deliberately a
    /// separate knob from `verify_threshold` — the shipped defaults sit 5
    /// points apart and callers may tune either independently.
    pub heuristic_confidence: u8,

    /// Concurrent extractions in [`crate::extract::extract_batch`].
    /// Default: 4.
    pub batch_concurrency: usize,

    /// Pre-constructed model boundary. Takes precedence over the built-in
    /// HTTP boundary; the credential check still applies.
    pub boundary: Option<Arc<dyn ModelBoundary>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            api_timeout_secs: 60,
            verify_threshold: 70,
            heuristic_confidence: 75,
            batch_concurrency: 4,
            boundary: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("verify_threshold", &self.verify_threshold)
            .field("heuristic_confidence", &self.heuristic_confidence)
            .field("batch_concurrency", &self.batch_concurrency)
            .field("boundary", &self.boundary.as_ref().map(|_| "<dyn ModelBoundary>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config with the credential read from the environment:
    /// `DOCINTEL_API_KEY`, then `OPENAI_API_KEY`. Read once, here.
    pub fn from_env() -> Self {
        let api_key = ["DOCINTEL_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// The configured credential, if usable (set and non-empty).
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn verify_threshold(mut self, t: u8) -> Self {
        self.config.verify_threshold = t.min(100);
        self
    }

    pub fn heuristic_confidence(mut self, c: u8) -> Self {
        self.config.heuristic_confidence = c.min(100);
        self
    }

    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.config.batch_concurrency = n.max(1);
        self
    }

    pub fn boundary(mut self, boundary: Arc<dyn ModelBoundary>) -> Self {
        self.config.boundary = Some(boundary);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if c.base_url.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_the_five_point_gap() {
        let c = ExtractionConfig::default();
        assert_eq!(c.verify_threshold, 70);
        assert_eq!(c.heuristic_confidence, 75);
    }

    #[test]
    fn builder_clamps_out_of_range_knobs() {
        let c = ExtractionConfig::builder()
            .temperature(9.0)
            .verify_threshold(200)
            .heuristic_confidence(255)
            .batch_concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.verify_threshold, 100);
        assert_eq!(c.heuristic_confidence, 100);
        assert_eq!(c.batch_concurrency, 1);
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = ExtractionConfig::builder().model("").build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn empty_api_key_is_not_a_credential() {
        let c = ExtractionConfig::builder().api_key("").build().unwrap();
        assert!(c.credential().is_none());
    }

    #[test]
    fn debug_redacts_the_credential() {
        let c = ExtractionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"), "got: {dbg}");
    }
}
