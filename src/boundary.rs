//! The external model boundary: send prompt + image, get text back.
//!
//! The pipeline treats recognition as an opaque capability behind
//! [`ModelBoundary`] — any provider that can look at an image and return
//! text satisfies the contract. The shipped [`HttpBoundary`] speaks the
//! OpenAI-compatible chat-completions dialect (which Ollama, vLLM, LiteLLM
//! and most hosted providers also accept), but tests and embedders can
//! substitute anything by implementing the trait.
//!
//! No parsing happens here: the boundary returns whatever text the model
//! produced, and the reply envelope's only structure is "text or no text".

use crate::error::ExtractError;
use crate::pipeline::image::ImagePayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure reported by the boundary (non-success status, unreachable host,
/// undecodable envelope). Carries the provider's machine-readable message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BoundaryError {
    pub message: String,
}

impl BoundaryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The boundary's success envelope: generated text, if any was produced.
#[derive(Debug, Clone)]
pub struct BoundaryReply {
    pub text: Option<String>,
}

/// Per-call generation options forwarded to the provider.
#[derive(Debug, Clone)]
pub struct BoundaryOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// An external multimodal model that can describe a document image.
#[async_trait]
pub trait ModelBoundary: Send + Sync {
    /// Send one prompt + image and return the raw reply envelope.
    async fn describe(
        &self,
        prompt: &str,
        image: &ImagePayload,
        options: &BoundaryOptions,
    ) -> Result<BoundaryReply, BoundaryError>;
}

// ── Default implementation: OpenAI-compatible chat completions ───────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Content {
    Text { r#type: &'static str, text: String },
    Image {
        r#type: &'static str,
        image_url: ImageUrl,
    },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// HTTP boundary for OpenAI-compatible chat-completions endpoints.
#[derive(Debug, Clone)]
pub struct HttpBoundary {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpBoundary {
    /// Build a boundary client for `base_url` with a per-call timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelBoundary for HttpBoundary {
    async fn describe(
        &self,
        prompt: &str,
        image: &ImagePayload,
        options: &BoundaryOptions,
    ) -> Result<BoundaryReply, BoundaryError> {
        let request = ChatRequest {
            model: options.model.clone(),
            messages: vec![Message {
                role: "user",
                content: vec![
                    Content::Text {
                        r#type: "text",
                        text: prompt.to_string(),
                    },
                    Content::Image {
                        r#type: "image_url",
                        image_url: ImageUrl {
                            url: image.to_data_uri(),
                        },
                    },
                ],
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(
            "Calling {} model '{}' with {}-byte payload",
            self.base_url,
            options.model,
            image.data.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| BoundaryError::new(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Model API returned {status}");
            return Err(BoundaryError::new(format!("HTTP {status}: {body}")));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| BoundaryError::new(format!("malformed response envelope: {e}")))?;

        let text = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(BoundaryReply { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let b = HttpBoundary::new("k", "https://api.example.com/v1/", 10).unwrap();
        assert_eq!(b.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn chat_request_serialises_content_parts() {
        let req = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message {
                role: "user",
                content: vec![
                    Content::Text {
                        r#type: "text",
                        text: "extract".into(),
                    },
                    Content::Image {
                        r#type: "image_url",
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AAAA".into(),
                        },
                    },
                ],
            }],
            max_tokens: 64,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert!(json["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png"));
    }

    #[test]
    fn response_envelope_tolerates_missing_content() {
        let envelope: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
        )
        .unwrap();
        assert!(envelope.choices[0].message.content.is_none());
    }
}
