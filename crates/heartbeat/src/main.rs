//! heartbeat — run every configured probe once, alert on state changes.
//!
//! # Usage
//!
//! ```text
//! heartbeat --config /etc/heartbeat.yaml --state /var/lib/heartbeat/state.json
//! ```
//!
//! Meant to be run from cron. Exits non-zero only when the config cannot be
//! used or the state file cannot be locked or written.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use heartbeat::{config_report, Heartbeat};
use heartbeat_core::HeartbeatConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "heartbeat",
    about = "Run health probes once and alert on state changes",
    version
)]
struct Cli {
    /// Probe and alert configuration (YAML).
    #[arg(short, long, default_value = "heartbeat.yaml")]
    config: PathBuf,

    /// State file carried between runs.
    #[arg(short, long, default_value = ".heartbeat.json")]
    state: PathBuf,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Validate the config, print each probe's identity, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("invalid log level '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = HeartbeatConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    if cli.check {
        for line in config_report(&config) {
            println!("{line}");
        }
        return Ok(());
    }

    let heartbeat = Heartbeat::new(config, &cli.state).context("failed to set up heartbeat")?;
    heartbeat
        .run()
        .await
        .with_context(|| format!("run against state file {} failed", cli.state.display()))?;

    Ok(())
}
