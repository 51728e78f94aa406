//! Game telemetry for the SimBox rig's haptic/display back-channel.
//!
//! Game-specific readers implement [`TelemetrySource`] and produce the
//! game-agnostic [`TelemetrySnapshot`]; the [`encoder`] turns snapshots
//! (or their absence) into wire frames at a fixed cadence. A source that
//! has nothing within the poll budget answers `Ok(None)` — never an error
//! and never a stall.

pub mod encoder;
pub mod f1;

pub use encoder::{FfbLevels, TelemetryEncoder};
pub use f1::F1UdpSource;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which side of the car is riding the curb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurbSide {
    Left,
    Right,
    Center,
    #[default]
    Unknown,
}

impl CurbSide {
    /// Wire collapse: left = -1, right = 1, center and unknown = 0.
    pub fn wire_value(&self) -> i8 {
        match self {
            CurbSide::Left => -1,
            CurbSide::Right => 1,
            CurbSide::Center | CurbSide::Unknown => 0,
        }
    }
}

/// Unified snapshot across game backends.
///
/// Unit conventions are normalised here, not at the consumer: speed is
/// km/h (already scaled), attitude is radians, G-forces are in g. Sources
/// whose native fields are 0..1 fractions must scale before populating.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySnapshot {
    pub speed_kmh: f32,
    pub g_lat: f32,
    pub g_lon: f32,
    pub g_vert: f32,
    pub yaw_rad: f32,
    pub pitch_rad: f32,
    pub roll_rad: f32,
    /// -1 = reverse, 0 = neutral, 1..=8 forward.
    pub gear: i8,
    pub rpm: u16,
    pub on_curb: bool,
    pub curb_side: CurbSide,
}

/// A live game-telemetry reader.
#[async_trait]
pub trait TelemetrySource: Send {
    /// Identifier for logs and config ("f1", "none", ...).
    fn game_id(&self) -> &str;

    /// Acquires sockets/handles. Failures here are startup-fatal.
    async fn start(&mut self) -> Result<()>;

    /// Returns the freshest snapshot obtainable within `budget`, or
    /// `None` if the game produced nothing in time.
    async fn read_snapshot(&mut self, budget: Duration) -> Result<Option<TelemetrySnapshot>>;

    /// Releases resources; idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Degraded-mode source: never yields a snapshot, so the bridge keeps
/// transmitting zero frames at cadence.
#[derive(Debug, Default)]
pub struct NullSource;

#[async_trait]
impl TelemetrySource for NullSource {
    fn game_id(&self) -> &str {
        "none"
    }

    async fn start(&mut self) -> Result<()> {
        Ok(())
    }

    async fn read_snapshot(&mut self, _budget: Duration) -> Result<Option<TelemetrySnapshot>> {
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curb_side_wire_values() {
        assert_eq!(CurbSide::Left.wire_value(), -1);
        assert_eq!(CurbSide::Right.wire_value(), 1);
        assert_eq!(CurbSide::Center.wire_value(), 0);
        assert_eq!(CurbSide::Unknown.wire_value(), 0);
    }

    #[tokio::test]
    async fn test_null_source_always_absent() -> Result<()> {
        let mut source = NullSource;
        source.start().await?;
        let snapshot = source.read_snapshot(Duration::from_millis(5)).await?;
        assert_eq!(snapshot, None);
        source.close().await?;
        Ok(())
    }
}
