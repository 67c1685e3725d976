//! CLI binary for docintel.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the extracted record.

use anyhow::Result;
use clap::Parser;
use docintel::{extract, DocumentKind, ExtractError, ExtractionConfig, ImageInput};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a receipt photo (human-readable table)
  docintel receipt scan.jpg

  # Extract an identity document as JSON
  docintel identity license.png --json

  # Use a local model via Ollama
  docintel receipt scan.jpg --base-url http://localhost:11434/v1 --model llava

  # Inline data-URI input
  docintel receipt "data:image/jpeg;base64,/9j/4AAQ..." --json

ENVIRONMENT VARIABLES:
  DOCINTEL_API_KEY   API credential (checked first)
  OPENAI_API_KEY     API credential (fallback)
  DOCINTEL_MODEL     Override the model ID
  DOCINTEL_BASE_URL  Override the endpoint base URL

SETUP:
  1. Set API key:  export DOCINTEL_API_KEY=sk-...
  2. Extract:      docintel receipt scan.jpg
"#;

/// Extract structured records from document photos using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "docintel",
    version,
    about = "Extract structured records from receipt and identity-document photos using Vision LLMs",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document kind: receipt or identity.
    #[arg(value_enum)]
    kind: KindArg,

    /// Image file path, or an inline data: URI.
    image: String,

    /// Model ID sent to the endpoint.
    #[arg(long, env = "DOCINTEL_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(long, env = "DOCINTEL_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// API credential (otherwise read from the environment).
    #[arg(long, env = "DOCINTEL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Confidence threshold for the verified flag (exclusive).
    #[arg(long, default_value_t = 70)]
    threshold: u8,

    /// Confidence assigned to heuristic-tier extractions.
    #[arg(long, default_value_t = 75)]
    heuristic_confidence: u8,

    /// Per-call API timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Max model output tokens.
    #[arg(long, default_value_t = 1024)]
    max_tokens: usize,

    /// Output the full ExtractionResult as JSON.
    #[arg(long)]
    json: bool,

    /// Also print the raw model reply to stderr.
    #[arg(long)]
    raw: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum KindArg {
    Receipt,
    Identity,
}

impl From<KindArg> for DocumentKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Receipt => DocumentKind::Receipt,
            KindArg::Identity => DocumentKind::Identity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .base_url(&cli.base_url)
        .verify_threshold(cli.threshold)
        .heuristic_confidence(cli.heuristic_confidence)
        .api_timeout_secs(cli.timeout)
        .max_tokens(cli.max_tokens);
    // Fall back to the environment when no --api-key was given.
    match cli.api_key {
        Some(key) => builder = builder.api_key(key),
        None => {
            if let Some(key) = ExtractionConfig::from_env().api_key {
                builder = builder.api_key(key);
            }
        }
    }
    let config = builder.build()?;

    // ── Resolve input form ───────────────────────────────────────────────
    let input = if cli.image.starts_with("data:") {
        ImageInput::Encoded(cli.image.clone())
    } else {
        let path = PathBuf::from(&cli.image);
        if !path.exists() {
            anyhow::bail!("image file not found: '{}'", cli.image);
        }
        ImageInput::Path(path)
    };

    // ── Extract ──────────────────────────────────────────────────────────
    let result = extract(cli.kind.into(), input, &config)
        .await
        .map_err(annotate)?;

    if cli.raw {
        eprintln!("--- raw model reply ---\n{}\n---", result.raw_text);
    }

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let colour = io::stdout().is_terminal();
    let width = result.fields.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in &result.fields {
        println!("{name:>width$}  {value}");
    }
    let meta = if colour {
        let flag = if result.verified {
            green("verified")
        } else {
            red("unverified")
        };
        format!(
            "confidence {}  ·  {}  ·  {}",
            bold(&result.confidence.to_string()),
            flag,
            dim(&format!("{}ms", result.duration_ms))
        )
    } else {
        let flag = if result.verified { "verified" } else { "unverified" };
        format!(
            "confidence {}  ·  {}  ·  {}ms",
            result.confidence, flag, result.duration_ms
        )
    };
    println!("\n{meta}");

    Ok(())
}

/// Attach an actionable hint to each error class.
fn annotate(e: ExtractError) -> anyhow::Error {
    let hint = match &e {
        ExtractError::MissingCredential => "set DOCINTEL_API_KEY and retry",
        ExtractError::ImageRead { .. } | ExtractError::InvalidImageInput { .. } => {
            "check the image path or try a different photo"
        }
        ExtractError::Transport { .. } | ExtractError::EmptyReply => "retry the extraction",
        _ => "see the message above",
    };
    anyhow::Error::new(e).context(format!("extraction failed ({hint})"))
}
