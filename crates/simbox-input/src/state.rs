//! Shared last-known controller state.

use simbox_shifter::GearPosition;

/// The most recent fully-parsed, non-rejected rig inputs, plus the edge
/// latches for handbrake and gear. Owned by the bridge behind a mutex:
/// written only from the reader path, read (copied) by the periodic axis
/// push.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    pub throttle: u8,
    pub brake: u8,
    /// Decoded steering angle in degrees, pre-gain.
    pub steer_angle_deg: f32,
    pub handbrake_held: bool,
    pub current_gear: GearPosition,
}

impl ControllerState {
    /// Rig-commanded reset: everything back to zero/neutral in one step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
