//! Outbound status-frame assembly.

use crate::TelemetrySnapshot;
use simbox_wire::StatusFrame;

/// Locally-computed force-feedback intensities. These are not part of game
/// telemetry; the bridge's effect logic sets them and they persist across
/// frames until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FfbLevels {
    pub rumble: u8,
    pub pwm_left: u8,
    pub pwm_right: u8,
}

/// Builds wire frames from snapshots; on an absent snapshot it emits a
/// fully-zeroed frame so the transmit cadence never depends on the game
/// being alive.
#[derive(Debug, Default)]
pub struct TelemetryEncoder {
    ffb: FfbLevels,
}

impl TelemetryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ffb(&mut self, levels: FfbLevels) {
        self.ffb = levels;
    }

    pub fn ffb(&self) -> FfbLevels {
        self.ffb
    }

    pub fn build(&self, snapshot: Option<&TelemetrySnapshot>) -> StatusFrame {
        let Some(snapshot) = snapshot else {
            return StatusFrame::default();
        };

        StatusFrame {
            g_lat: snapshot.g_lat,
            g_lon: snapshot.g_lon,
            g_vert: snapshot.g_vert,
            yaw: snapshot.yaw_rad,
            pitch: snapshot.pitch_rad,
            roll: snapshot.roll_rad,
            speed: clamp_byte(snapshot.speed_kmh),
            gear: snapshot.gear,
            rpm: u8::try_from(snapshot.rpm.min(255)).unwrap_or(u8::MAX),
            on_curb: snapshot.on_curb,
            curb_side: snapshot.curb_side.wire_value(),
            rumble: self.ffb.rumble,
            pwm_left: self.ffb.pwm_left,
            pwm_right: self.ffb.pwm_right,
        }
    }
}

fn clamp_byte(value: f32) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value.round() as u8
    }
}
