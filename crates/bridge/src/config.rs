//! Daemon configuration, loaded from YAML with full defaults.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use simbox_input::TranslatorConfig;
use simbox_telemetry::f1::DEFAULT_F1_PORT;
use simbox_telemetry::{F1UdpSource, NullSource, TelemetrySource};
use std::path::Path;
use std::time::Duration;

/// Which game backend feeds the outbound status frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// F1 2x UDP telemetry listener.
    F1,
    /// No game attached; zero frames keep the cadence alive.
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TelemetryConfig {
    /// Master switch for the outbound direction.
    pub transmit: bool,
    pub source: SourceKind,
    pub f1_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            transmit: true,
            source: SourceKind::None,
            f1_port: DEFAULT_F1_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeConfig {
    /// Serial device node. The port itself (baud, raw mode) must already
    /// be configured; the daemon only reads and writes the node.
    pub device: String,
    /// Informational only, for logs and operator sanity.
    pub baud: u32,
    /// Continuous-axis refresh period.
    pub axis_period_ms: u64,
    /// Outbound status-frame period.
    pub transmit_period_ms: u64,
    /// Per-tick budget for the telemetry source poll.
    pub poll_budget_ms: u64,
    pub translator: TranslatorConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
            axis_period_ms: 10,
            transmit_period_ms: 50,
            poll_budget_ms: 20,
            translator: TranslatorConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.axis_period_ms == 0 {
            bail!("axis_period_ms must be non-zero");
        }
        if self.transmit_period_ms == 0 {
            bail!("transmit_period_ms must be non-zero");
        }
        if self.poll_budget_ms >= self.transmit_period_ms {
            bail!(
                "poll_budget_ms ({}) must be shorter than transmit_period_ms ({})",
                self.poll_budget_ms,
                self.transmit_period_ms
            );
        }
        self.translator.validate().context("translator config")?;
        Ok(())
    }

    pub fn axis_period(&self) -> Duration {
        Duration::from_millis(self.axis_period_ms)
    }

    pub fn transmit_period(&self) -> Duration {
        Duration::from_millis(self.transmit_period_ms)
    }

    pub fn poll_budget(&self) -> Duration {
        Duration::from_millis(self.poll_budget_ms)
    }

    /// Instantiates the configured telemetry source. Binding/starting is
    /// deferred to [`TelemetrySource::start`].
    pub fn make_source(&self) -> Box<dyn TelemetrySource> {
        match self.telemetry.source {
            SourceKind::F1 => Box::new(F1UdpSource::with_port(self.telemetry.f1_port)),
            SourceKind::None => Box::new(NullSource),
        }
    }
}
