//! H-pattern gearstick decoding for the SimBox rig.
//!
//! The rig reports the physical lever as two raw 8-bit axis samples.
//! [`GearGrid`] maps a sample pair onto a 2×3 gate via two independent
//! threshold bands with deliberate gaps in between: a lever resting near a
//! band boundary lands in a gap and decodes as neutral instead of
//! chattering between adjacent gears.

#![deny(clippy::unwrap_used)]

pub mod grid;
pub mod types;

pub use grid::GearGrid;
pub use types::{Col, GateSample, GearPosition, Row};

use thiserror::Error;

pub const NEUTRAL_GEAR: u8 = 0;
/// Gate index conventionally wired as reverse.
pub const REVERSE_GEAR: u8 = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShifterError {
    #[error("grid thresholds out of order: {0}")]
    InvalidGrid(String),
}

pub type ShifterResult<T> = Result<T, ShifterError>;
