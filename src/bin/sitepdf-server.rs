//! HTTP service binary.
//!
//! Maps flags onto [`sitepdf::ServiceConfig`] and serves
//! `POST /generate-pdf` until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use sitepdf::{server, ServiceConfig, SitePdf};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve URL-to-PDF generation over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "sitepdf-server",
    version,
    about = "Serve URL-to-PDF generation over HTTP",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "SITEPDF_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Region exported to the advice command.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Advice command line; the prompt is appended as the last argument.
    #[arg(long, env = "SITEPDF_ADVICE_COMMAND", default_value = "aws q ask")]
    advice_command: String,

    /// Deadline for one advice call in seconds.
    #[arg(long, env = "SITEPDF_ADVICE_TIMEOUT", default_value_t = 30)]
    advice_timeout: u64,

    /// Never consult the advisor; always render with defaults.
    #[arg(long, env = "SITEPDF_NO_ADVICE")]
    no_advice: bool,

    /// Chrome/Chromium executable. Searched for when unset.
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SITEPDF_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ServiceConfig::builder()
        .bind(cli.bind)
        .region(&cli.region)
        .advice_command(&cli.advice_command)
        .advice_timeout_secs(cli.advice_timeout)
        .advice_enabled(!cli.no_advice);
    if let Some(chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    let config = builder.build().context("Invalid configuration")?;

    info!(
        "Advice: {} (region {}, {}s deadline)",
        if config.advice_enabled { "enabled" } else { "disabled" },
        config.region,
        config.advice_timeout_secs
    );

    let service = Arc::new(SitePdf::from_config(&config));
    server::serve(config.bind, service)
        .await
        .with_context(|| format!("Server on {} failed", config.bind))
}
