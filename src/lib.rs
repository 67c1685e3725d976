//! # docintel
//!
//! Extract validated structured records from photographed receipts and
//! identity documents using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Classic OCR gives you a wall of unordered text and leaves the hard part
//! — which line is the vendor, which number is the total — to you. This
//! crate hands the photograph to a VLM with a schema-shaped prompt, then
//! defensively parses, normalises, and scores whatever comes back, so the
//! caller always receives a complete typed record with an honest
//! confidence score instead of an exception.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Photo
//!  │
//!  ├─ 1. Image    bytes / data-URI / file path → canonical base64
//!  ├─ 2. Schema   field list + prompt for the document kind
//!  ├─ 3. Client   credential gate, boundary call, raw text back
//!  ├─ 4. Parse    strict JSON tier, then heuristic line tier
//!  ├─ 5. Normalise dates → YYYY-MM-DD, amounts → numbers, sentinel defaults
//!  └─ 6. Verify   advisory trust flag from confidence + required fields
//! ```
//!
//! Steps 4–6 never fail: once the model has produced any text, the result
//! degrades to sentinel defaults with confidence 0 rather than erroring.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docintel::{extract, DocumentKind, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read once from DOCINTEL_API_KEY / OPENAI_API_KEY
//!     let config = ExtractionConfig::from_env();
//!     let result = extract(DocumentKind::Receipt, std::path::PathBuf::from("receipt.jpg"), &config).await?;
//!     println!("{}: {} (confidence {})",
//!         result.field("vendor").unwrap(),
//!         result.field("amount").unwrap(),
//!         result.confidence);
//!     if !result.verified {
//!         eprintln!("low confidence — review before saving");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docintel` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docintel = { version = "0.3", default-features = false }
//! ```
//!
//! ## Bring your own model
//!
//! The external model is an opaque boundary: anything that can take a
//! prompt plus a base64 image and return text satisfies
//! [`ModelBoundary`]. The shipped [`HttpBoundary`] speaks the
//! OpenAI-compatible chat-completions dialect, which also covers Ollama,
//! vLLM, LiteLLM, and most hosted providers via
//! [`ExtractionConfig::base_url`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod boundary;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod result;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use boundary::{BoundaryError, BoundaryOptions, BoundaryReply, HttpBoundary, ModelBoundary};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{extract, extract_batch, extract_sync};
pub use pipeline::image::{ImageInput, ImagePayload};
pub use result::{ExtractionResult, FieldValue, ParseTier};
pub use schema::{DocumentKind, ExtractionSchema, FieldKind, FieldSpec, UNKNOWN};
