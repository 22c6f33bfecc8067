//! CLI binary for pdf2fields.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one extraction, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2fields::{
    extract, preview_first_page, recognize, DocumentCategory, ExtractionConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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
  # Extract marksheet fields, print the labelled report
  pdf2fields --category marksheet marksheet.pdf

  # Write the JSON artifact next to the report
  pdf2fields --category offer-letter offer.pdf -o extracted_entities_offer_letter.json

  # Use the conventional artifact filename in the current directory
  pdf2fields --category marksheet marksheet.pdf --save

  # Check what OCR sees before spending a model call
  pdf2fields --category marksheet marksheet.pdf --ocr-only

  # Save a first-page preview PNG
  pdf2fields --category marksheet marksheet.pdf --preview page1.png

  # Point at a different endpoint / model
  pdf2fields --category marksheet marksheet.pdf \
      --endpoint http://localhost:8000/v1 --model qwen2.5:7b

DOCUMENT CATEGORIES:
  Category      Entities extracted
  ─────────     ─────────────────────────────────────────────────
  marksheet     Name, Mothers Name, Subject Names, Total Marks
  offer-letter  Name, Organisation Name, Date, Designation

ENVIRONMENT VARIABLES:
  PDF2FIELDS_ENDPOINT       Completion endpoint base URL
  PDF2FIELDS_MODEL          Model identifier
  PDF2FIELDS_TESSERACT_CMD  OCR engine command or absolute path
  PDFIUM_DYNAMIC_LIB_PATH   Directory containing libpdfium

SETUP:
  1. Install tesseract:   apt install tesseract-ocr
  2. Start a local model: ollama serve && ollama pull llama3.1
  3. Extract:             pdf2fields --category marksheet doc.pdf
"#;

/// Extract named fields from a scanned PDF via OCR and a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2fields",
    version,
    about = "Extract named fields from scanned PDF documents via OCR and a local LLM",
    long_about = "Rasterises a PDF, recognises its text with tesseract, and asks a locally \
hosted OpenAI-compatible model (Ollama, vLLM, LM Studio, ...) for the named fields of the \
chosen document category.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Document category: marksheet or offer-letter.
    #[arg(short, long, value_enum)]
    category: CategoryArg,

    /// Write the JSON artifact to this path.
    #[arg(short, long, env = "PDF2FIELDS_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the artifact to ./extracted_entities_<category>.json.
    #[arg(long, conflicts_with = "output")]
    save: bool,

    /// Print the full extraction output as JSON instead of the report.
    #[arg(long, env = "PDF2FIELDS_JSON")]
    json: bool,

    /// Print the recognised OCR text and exit (no model call, no API needed).
    #[arg(long)]
    ocr_only: bool,

    /// Save a first-page preview PNG to this path before extracting.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Completion endpoint base URL (OpenAI-compatible, no auth).
    #[arg(long, env = "PDF2FIELDS_ENDPOINT", default_value = pdf2fields::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model identifier sent with the completion request.
    #[arg(long, env = "PDF2FIELDS_MODEL", default_value = pdf2fields::DEFAULT_MODEL)]
    model: String,

    /// OCR engine command or absolute path.
    #[arg(long, env = "PDF2FIELDS_TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: String,

    /// Rendering DPI for the OCR pass (72–400).
    #[arg(long, env = "PDF2FIELDS_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2FIELDS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2FIELDS_MAX_TOKENS", default_value_t = 300)]
    max_tokens: usize,

    /// Retries on a transient completion failure.
    #[arg(long, env = "PDF2FIELDS_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-completion-call timeout in seconds.
    #[arg(long, env = "PDF2FIELDS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2FIELDS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2FIELDS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2FIELDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the report/artifact.
    #[arg(short, long, env = "PDF2FIELDS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CategoryArg {
    Marksheet,
    OfferLetter,
}

impl From<CategoryArg> for DocumentCategory {
    fn from(v: CategoryArg) -> Self {
        match v {
            CategoryArg::Marksheet => DocumentCategory::Marksheet,
            CategoryArg::OfferLetter => DocumentCategory::OfferLetter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let category: DocumentCategory = cli.category.into();
    let config = build_config(&cli).await?;
    let input = cli.input.clone();

    // ── OCR-only mode ────────────────────────────────────────────────────
    if cli.ocr_only {
        let spinner = spinner_if(show_progress, "Recognising text…");
        let text = recognize(&input, &config).await;
        finish_spinner(spinner);
        let text = text.context("OCR failed")?;
        println!("{}", text.trim_start());
        return Ok(());
    }

    // ── Preview ──────────────────────────────────────────────────────────
    if let Some(ref preview_path) = cli.preview {
        let png = preview_first_page(&input, &config)
            .await
            .context("Preview rendering failed")?;
        std::fs::write(preview_path, &png)
            .with_context(|| format!("Failed to write preview to {}", preview_path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} preview → {}  {}",
                green("✔"),
                bold(&preview_path.display().to_string()),
                dim(&format!("{} bytes", png.len()))
            );
        }
    }

    // ── Extract ──────────────────────────────────────────────────────────
    let spinner = spinner_if(show_progress, "Processing document…");
    let result = extract(&input, category, &config).await;
    finish_spinner(spinner);

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(1);
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", bold(&format!("── {} ──", output.category)))?;
        handle.write_all(output.render_report().as_bytes())?;
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {} pages  {}ms total  {}",
            green("✔"),
            output.stats.total_pages,
            output.stats.total_duration_ms,
            dim(&format!(
                "render {}ms / ocr {}ms / llm {}ms",
                output.stats.render_duration_ms,
                output.stats.ocr_duration_ms,
                output.stats.llm_duration_ms
            )),
        );
        if output.stats.empty_ocr_pages > 0 {
            eprintln!(
                "  {} {} pages produced no text",
                red("⚠"),
                output.stats.empty_ocr_pages
            );
        }
    }

    // ── Artifact ─────────────────────────────────────────────────────────
    let artifact_path = if cli.save {
        Some(PathBuf::from(output.artifact_filename()))
    } else {
        cli.output.clone()
    };
    if let Some(path) = artifact_path {
        output
            .write_artifact(&path)
            .context("Failed to write JSON artifact")?;
        if !cli.quiet {
            eprintln!("{} artifact → {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .endpoint(cli.endpoint.clone())
        .model(cli.model.clone())
        .tesseract_cmd(cli.tesseract_cmd.clone())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

fn spinner_if(show: bool, message: &'static str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}
