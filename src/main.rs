//! lanserve: a no-cache static file server for local development.
//!
//! Initializes tracing, builds the server configuration from the command
//! line, and serves the working directory until killed.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lanserve::config::{LogFormat, DEFAULT_LOG_FILTER};
use lanserve::ServerConfig;

/// Serve the current directory on the local network with caching disabled
#[derive(Parser, Debug)]
#[command(name = "lanserve", version, about)]
struct Args {
    /// Serve over HTTPS with a self-signed certificate (generated on first run)
    #[arg(short = 's', long)]
    https: bool,

    /// Log level filter (e.g., "lanserve=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(args: &Args) {
    // Priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    let config = ServerConfig::from_flags(args.https);

    match lanserve::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
