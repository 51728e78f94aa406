//! Threshold-grid decoding of the raw gearstick axes.

use crate::{Col, GateSample, GearPosition, Row, ShifterError, ShifterResult};
use serde::{Deserialize, Serialize};

/// Threshold bands for the two gearstick axes.
///
/// The vertical axis splits into `Up` (`gy <= up_max`) and `Down`
/// (`gy >= down_min`). The horizontal axis is wired inverted on the rig —
/// a low raw value means the lever is physically to the right — so
/// `gx <= right_max` is the right column, `center_min..=center_max` the
/// middle and `gx >= left_min` the left. Every pair of adjacent bands must
/// leave a gap; samples in a gap decode as neutral.
///
/// Gate layout (row, col) → gear:
///
/// ```text
///          left  center  right
///   up       1      3      5
///   down     2      4      6   (6 = reverse)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GearGrid {
    pub up_max: u8,
    pub down_min: u8,
    pub right_max: u8,
    pub center_min: u8,
    pub center_max: u8,
    pub left_min: u8,
}

impl Default for GearGrid {
    fn default() -> Self {
        Self {
            up_max: 110,
            down_min: 140,
            right_max: 95,
            center_min: 110,
            center_max: 132,
            left_min: 150,
        }
    }
}

impl GearGrid {
    /// Checks band ordering. A grid whose bands touch or overlap loses the
    /// anti-chatter gaps, so it is rejected at configuration time.
    pub fn validate(&self) -> ShifterResult<()> {
        if self.up_max >= self.down_min {
            return Err(ShifterError::InvalidGrid(format!(
                "up_max ({}) must be below down_min ({})",
                self.up_max, self.down_min
            )));
        }
        if self.right_max >= self.center_min {
            return Err(ShifterError::InvalidGrid(format!(
                "right_max ({}) must be below center_min ({})",
                self.right_max, self.center_min
            )));
        }
        if self.center_min > self.center_max {
            return Err(ShifterError::InvalidGrid(format!(
                "center band empty ({}..{})",
                self.center_min, self.center_max
            )));
        }
        if self.center_max >= self.left_min {
            return Err(ShifterError::InvalidGrid(format!(
                "center_max ({}) must be below left_min ({})",
                self.center_max, self.left_min
            )));
        }
        Ok(())
    }

    /// Decodes one raw sample pair. Pure: identical inputs always produce
    /// identical outputs, with no latched state.
    pub fn decode(&self, gx: u8, gy: u8) -> GateSample {
        let row = if gy <= self.up_max {
            Row::Up
        } else if gy >= self.down_min {
            Row::Down
        } else {
            Row::Mid
        };

        let col = if gx <= self.right_max {
            Col::Right
        } else if (self.center_min..=self.center_max).contains(&gx) {
            Col::Center
        } else if gx >= self.left_min {
            Col::Left
        } else {
            Col::Mid
        };

        let index = match (row, col) {
            (Row::Up, Col::Left) => 1,
            (Row::Down, Col::Left) => 2,
            (Row::Up, Col::Center) => 3,
            (Row::Down, Col::Center) => 4,
            (Row::Up, Col::Right) => 5,
            (Row::Down, Col::Right) => 6,
            _ => 0,
        };

        GateSample {
            gear: GearPosition::new(index),
            row,
            col,
        }
    }
}
