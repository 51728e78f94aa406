//! simboxd - SimBox rig serial bridge daemon.

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use simbox_bridge::{Bridge, BridgeConfig, SourceKind};
use simbox_input::{TracingGamepad, TracingKeyboard};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simboxd")]
#[command(about = "Bridges a SimBox rig over a serial link to a virtual gamepad and keyboard")]
#[command(version)]
struct Cli {
    /// YAML configuration file; defaults apply when omitted
    #[arg(short, long, env = "SIMBOXD_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device node, overriding the config file
    #[arg(short, long)]
    device: Option<String>,

    /// Telemetry source, overriding the config file
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(device) = cli.device {
        config.device = device;
    }
    if let Some(source) = cli.source {
        config.telemetry.source = source;
    }
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        device = %config.device,
        baud = config.baud,
        source = ?config.telemetry.source,
        "starting simboxd"
    );

    // The device node is expected to be configured (baud, raw mode)
    // before the daemon starts; two handles give the reader and writer
    // independent positions.
    let reader = tokio::fs::File::open(&config.device)
        .await
        .with_context(|| format!("opening {} for reading", config.device))?;
    let writer = tokio::fs::OpenOptions::new()
        .write(true)
        .open(&config.device)
        .await
        .with_context(|| format!("opening {} for writing", config.device))?;

    let source = config.make_source();
    let gamepad = Arc::new(Mutex::new(TracingGamepad));
    let keyboard = Arc::new(Mutex::new(TracingKeyboard));
    let bridge = Bridge::new(config, gamepad, keyboard);

    bridge.run(BufReader::new(reader), writer, source).await?;
    info!("simboxd stopped");
    Ok(())
}
