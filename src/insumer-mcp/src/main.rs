//! Insumer MCP server binary.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use insumer_client::ClientConfig;
use insumer_mcp::{KeyPolicy, build_server, check_api_key};

/// Insumer MCP server
#[derive(Parser)]
#[command(name = "insumer-mcp")]
#[command(about = "Expose the Insumer attestation API as MCP tools over stdio")]
#[command(version)]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Exit at startup when INSUMER_API_KEY is not set, instead of failing
    /// each tool call that needs it.
    #[arg(long)]
    require_api_key: bool,
}

impl Args {
    fn key_policy(&self) -> KeyPolicy {
        if self.require_api_key {
            KeyPolicy::Require
        } else {
            KeyPolicy::Warn
        }
    }
}

/// Logs go to stderr; stdout carries protocol frames only.
fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let config = ClientConfig::from_env();
    if let Err(e) = check_api_key(&config, args.key_policy()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let server = match build_server(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match server.run_stdio().await {
        Ok(()) => {
            info!("Input closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Server error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
