//! CLI binary for resume2json.
//!
//! A thin shim over the library crate: read a file, classify it from
//! its extension, run the extraction pipeline, print the record as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use resume2json::{extract_resume, PipelineConfig, UploadedDocument};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a resume to pretty-printed JSON on stdout
  resume2json resume.pdf

  # Compact single-line JSON (for piping)
  resume2json --compact resume.pdf

  # Scanned resume image (OCR fallback needs the tesseract binary)
  resume2json scan.png

EXTRACTION TIERS (first success wins):
  1. Vision    Gemini reads rendered page images     needs GEMINI_API_KEY
  2. Text A    DigitalOcean Qwen3 over extracted text  needs DO_API_KEY
  3. Text B    NVIDIA Kimi over extracted text         needs NVIDIA_API_KEY
  4. Regex     deterministic parsing, always available

  With no API keys configured, only the regex tier runs — the tool still
  produces a record, just a shallower one.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY   Google Gemini key (vision tier)
  DO_API_KEY       DigitalOcean inference key (text tier A)
  NVIDIA_API_KEY   NVIDIA integrate key (text tier B)

  PDF rasterisation for the vision tier binds libpdfium at runtime; if
  the library is absent the pipeline silently continues with the text
  tiers. PDF *text* extraction has no native dependency.
"#;

/// Extract structured resume data from a PDF, image, or text file.
#[derive(Parser, Debug)]
#[command(
    name = "resume2json",
    version,
    about = "Extract structured resume data from PDF, image, and text files",
    long_about = "Extract a structured resume record (name, contact, education, experience, \
skills) from a PDF, image, or plain-text file using tiered AI providers with a deterministic \
regex fallback. Always produces a record, even with no AI providers configured.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the resume file (.pdf, .png, .jpg, .jpeg, .webp, .bmp, .txt).
    input: PathBuf,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "RESUME2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let filename = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let media_type = media_type_for(&cli.input);

    let doc = UploadedDocument::new(bytes, media_type, filename);
    let config = PipelineConfig::from_env();
    let record = extract_resume(&doc, &config).await;

    let json = if cli.compact {
        serde_json::to_string(&record)
    } else {
        serde_json::to_string_pretty(&record)
    }
    .context("failed to serialise record")?;
    println!("{json}");

    Ok(())
}

/// Infer the declared media type from the file extension. Unknown
/// extensions fall through as an opaque type; the pipeline will still
/// try text extraction and the regex tier.
fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
