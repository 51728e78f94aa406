//! Gearstick type definitions

use crate::{NEUTRAL_GEAR, REVERSE_GEAR};
use serde::{Deserialize, Serialize};

/// Vertical band the lever sits in. `Mid` is the gap between the two
/// engaged rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Row {
    Up,
    Down,
    Mid,
}

/// Horizontal band the lever sits in. `Mid` is either inter-band gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Col {
    Left,
    Center,
    Right,
    Mid,
}

/// A decoded gate: the latched gear index plus the raw band classification
/// it came from, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSample {
    pub gear: GearPosition,
    pub row: Row,
    pub col: Col,
}

/// A gear index on the rig: 0 = neutral, 1..=5 forward, 6 = reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearPosition {
    pub index: u8,
}

impl GearPosition {
    pub fn new(index: u8) -> Self {
        Self { index }
    }

    pub fn neutral() -> Self {
        Self::new(NEUTRAL_GEAR)
    }

    pub fn is_neutral(&self) -> bool {
        self.index == NEUTRAL_GEAR
    }

    pub fn is_reverse(&self) -> bool {
        self.index == REVERSE_GEAR
    }
}

impl Default for GearPosition {
    fn default() -> Self {
        Self::neutral()
    }
}
