#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use m3u8_validator::{
    ChannelValidator, ValidatorConfig,
    config::{DEFAULT_MAX_VARIANT_HOPS, DEFAULT_TIMEOUT},
    server,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Checks whether HLS (.m3u8) stream URLs are reachable and playable
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Seconds any single outbound request may take
    #[arg(long, env = "VALIDATOR_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// How many master playlists may be followed before giving up
    #[arg(long, env = "VALIDATOR_MAX_VARIANT_HOPS", default_value_t = DEFAULT_MAX_VARIANT_HOPS)]
    max_variant_hops: usize,

    /// Address the HTTP server listens on
    #[arg(long, global = true, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serves the validation endpoint over HTTP [default]
    Serve,
    /// Validates a single URL and prints the report as JSON
    Check {
        /// Stream URL to validate
        url: String,
    },
}

impl Args {
    fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            timeout: Duration::from_secs(self.timeout),
            max_variant_hops: self.max_variant_hops,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    ensure!(args.timeout > 0, "--timeout must be at least 1 second");

    let validator =
        ChannelValidator::new(args.validator_config()).context("Building HTTP client")?;

    match args.command {
        Some(Command::Check { url }) => {
            let result = validator.validate(&url).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Serializing report")?
            );
        }
        Some(Command::Serve) | None => run_server(args.bind, validator).await?,
    }

    Ok(())
}

async fn run_server(bind: SocketAddr, validator: ChannelValidator) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Launching HTTP server on {bind}"))?;

    let ct = CancellationToken::new();
    spawn_ct_watcher(ct.clone());

    server::serve(listener, validator, ct)
        .await
        .context("Serving HTTP requests")?;

    info!("Server shut down");
    Ok(())
}

/// Spawn a task that watches for CTRL + C signal and cancels a [`CancellationToken`] when caught
fn spawn_ct_watcher(ct: CancellationToken) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Caught CTRL+C signal!");
        ct.cancel();
    });
}
