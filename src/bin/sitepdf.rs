//! CLI client for the sitepdf service.
//!
//! A thin shim over [`sitepdf::PdfClient`]: posts the URL, writes the PDF,
//! prints what the advisor said.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sitepdf::client::{default_output_filename, DEFAULT_API_URL};
use sitepdf::PdfClient;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;
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
  # Render against a local server (default output name)
  sitepdf https://github.com

  # Choose the output file
  sitepdf example.com reports/example.pdf

  # Use a deployed endpoint
  sitepdf example.com out.pdf https://abc123.execute-api.us-east-1.amazonaws.com/prod/generate-pdf

ENVIRONMENT VARIABLES:
  SITEPDF_API_URL   Endpoint used when no api-url argument is given
  RUST_LOG          Overrides the log filter chosen by --verbose/--quiet
"#;

/// Render a web page to PDF through the sitepdf API.
#[derive(Parser, Debug)]
#[command(
    name = "sitepdf",
    version,
    about = "Render a web page to PDF through the sitepdf API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Page to render. `https://` is added when no scheme is given.
    url: String,

    /// Output file. Default: pdf_<domain>_<unix-millis>.pdf
    output: Option<PathBuf>,

    /// API endpoint.
    #[arg(env = "SITEPDF_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SITEPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SITEPDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", red("✘"), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_filename(&cli.url)));
    let client = PdfClient::new(&cli.api_url).context("Failed to create HTTP client")?;
    debug!("Posting to {}", client.api_url());

    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Rendering");
        bar.set_message(cli.url.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let start = Instant::now();
    let result = client.save_pdf(&cli.url, &output, None).await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let saved = result.with_context(|| format!("Failed to generate PDF for {}", cli.url))?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            format_size(saved.file_size),
            dim(&format!("{:.1}s", start.elapsed().as_secs_f64())),
            bold(&saved.file_path.display().to_string()),
        );
        let insights = serde_json::to_string_pretty(&saved.q_insights)
            .context("Failed to format insights")?;
        eprintln!("{}\n{}", bold("Insights:"), insights);
    }
    Ok(())
}

fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.2} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}
