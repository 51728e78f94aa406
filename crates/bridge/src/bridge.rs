//! The three-loop bridge core.

use crate::config::BridgeConfig;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use simbox_input::{ControllerState, GamepadSink, InputTranslator, KeyboardSink};
use simbox_telemetry::{FfbLevels, TelemetryEncoder, TelemetrySource};
use simbox_wire::{decode_report, encode_status};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Bridge between one rig serial link and one pair of virtual input
/// sinks. Generic over the sinks so tests can substitute recorders; the
/// serial ends are plain async byte streams chosen at `run` time.
pub struct Bridge<G, K> {
    config: BridgeConfig,
    translator: InputTranslator,
    state: Arc<Mutex<ControllerState>>,
    gamepad: Arc<Mutex<G>>,
    keyboard: Arc<Mutex<K>>,
    encoder: Mutex<TelemetryEncoder>,
}

impl<G, K> Bridge<G, K>
where
    G: GamepadSink,
    K: KeyboardSink,
{
    pub fn new(config: BridgeConfig, gamepad: Arc<Mutex<G>>, keyboard: Arc<Mutex<K>>) -> Self {
        let translator = InputTranslator::new(config.translator.clone());
        Self {
            config,
            translator,
            state: Arc::new(Mutex::new(ControllerState::default())),
            gamepad,
            keyboard,
            encoder: Mutex::new(TelemetryEncoder::new()),
        }
    }

    /// Shared handle to the last-known controller state.
    pub fn state(&self) -> Arc<Mutex<ControllerState>> {
        Arc::clone(&self.state)
    }

    /// Installs locally-computed force-feedback levels into subsequent
    /// outbound frames.
    pub fn set_ffb(&self, levels: FfbLevels) {
        self.encoder.lock().set_ffb(levels);
    }

    /// Runs until Ctrl-C or serial EOF.
    pub async fn run<R, W>(
        &self,
        reader: R,
        writer: W,
        source: Box<dyn TelemetrySource>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.run_until(reader, writer, source, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "ctrl-c handler failed; running until serial EOF");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs all three loops until the shutdown future resolves, the
    /// serial input reaches EOF, or one of the ends fails hard. The
    /// source is closed on every exit path.
    pub async fn run_until<R, W, F>(
        &self,
        reader: R,
        writer: W,
        mut source: Box<dyn TelemetrySource>,
        shutdown: F,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        source
            .start()
            .await
            .with_context(|| format!("starting telemetry source {}", source.game_id()))?;
        info!(
            game = source.game_id(),
            transmit = self.config.telemetry.transmit,
            "bridge running"
        );

        let result = tokio::select! {
            r = self.reader_loop(reader) => r,
            r = self.axis_loop() => r,
            r = self.telemetry_loop(writer, source.as_mut()) => r,
            () = shutdown => {
                info!("shutdown requested");
                Ok(())
            }
        };

        if let Err(e) = source.close().await {
            warn!(error = %e, "closing telemetry source failed");
        }
        result
    }

    /// Inbound direction: one report line per iteration. Anything short
    /// of an I/O error on the serial link is logged and skipped.
    async fn reader_loop<R: AsyncBufRead + Unpin>(&self, mut reader: R) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("reading from serial link")?;
            if n == 0 {
                info!("serial input closed");
                return Ok(());
            }

            // Line noise on the link must never take the loop down.
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            let report = match decode_report(line) {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, line, "dropping malformed report");
                    continue;
                }
            };
            debug!(?report, "report");

            if let Err(e) = self
                .translator
                .apply(&report, &self.state, &self.gamepad, &self.keyboard)
                .await
            {
                warn!(error = %e, "sink rejected report");
            }
        }
    }

    /// Re-pushes steering and triggers from the state copy every tick so
    /// the pad holds its position between reports.
    async fn axis_loop(&self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.axis_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let snapshot = *self.state.lock();
            if let Err(e) = self.translator.push_axes(&snapshot, &mut *self.gamepad.lock()) {
                warn!(error = %e, "axis push failed");
            }
        }
    }

    /// Outbound direction: poll, encode, write. A source or write
    /// failure costs one frame, never the loop.
    async fn telemetry_loop<W: AsyncWrite + Unpin>(
        &self,
        mut writer: W,
        source: &mut dyn TelemetrySource,
    ) -> Result<()> {
        if !self.config.telemetry.transmit {
            info!("telemetry transmit disabled");
            std::future::pending::<()>().await;
        }

        let budget = self.config.poll_budget();
        let mut ticker = tokio::time::interval(self.config.transmit_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;

            let snapshot = match source.read_snapshot(budget).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(error = %e, game = source.game_id(), "telemetry poll failed");
                    None
                }
            };

            let frame = self.encoder.lock().build(snapshot.as_ref());
            let line = encode_status(&frame);
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                warn!(error = %e, "status frame write failed");
                continue;
            }
            if let Err(e) = writer.flush().await {
                warn!(error = %e, "status frame flush failed");
            }
        }
    }
}
