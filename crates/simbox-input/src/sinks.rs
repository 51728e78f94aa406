//! Abstract output sinks and their in-memory/test implementations.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("virtual device rejected update: {0}")]
    Device(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Buttons of the Xbox-style virtual pad the rig's discrete inputs map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadButton {
    Start,
    Back,
    A,
    B,
    X,
    Y,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftShoulder,
    RightShoulder,
    LeftThumb,
    RightThumb,
}

/// Virtual gamepad device. Axis/trigger/button calls stage values; `flush`
/// commits the staged report to the driver. Order matters to callers:
/// press before flush, flush before the hold window.
pub trait GamepadSink: Send {
    /// Left-stick X, full signed 16-bit range.
    fn set_steer_axis(&mut self, value: i16) -> SinkResult<()>;
    /// Right trigger, 0-255.
    fn set_throttle(&mut self, value: u8) -> SinkResult<()>;
    /// Left trigger, 0-255.
    fn set_brake(&mut self, value: u8) -> SinkResult<()>;
    fn press(&mut self, button: PadButton) -> SinkResult<()>;
    fn release(&mut self, button: PadButton) -> SinkResult<()>;
    fn flush(&mut self) -> SinkResult<()>;
}

/// Simulated keyboard. Keys are referred to by name ("space", "1", ...).
pub trait KeyboardSink: Send {
    fn press_key(&mut self, key: &str) -> SinkResult<()>;
    fn release_key(&mut self, key: &str) -> SinkResult<()>;
}

// ── Test doubles ─────────────────────────────────────────────────────────

/// Every observable gamepad effect, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadEvent {
    Steer(i16),
    Throttle(u8),
    Brake(u8),
    Press(PadButton),
    Release(PadButton),
    Flush,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press(String),
    Release(String),
}

/// Gamepad double that records the exact event order. Shared by unit and
/// integration tests across the workspace.
#[derive(Debug, Default)]
pub struct RecordingGamepad {
    pub events: Vec<PadEvent>,
}

impl RecordingGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presses(&self) -> Vec<PadButton> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PadEvent::Press(button) => Some(*button),
                _ => None,
            })
            .collect()
    }

    pub fn last_steer(&self) -> Option<i16> {
        self.events.iter().rev().find_map(|event| match event {
            PadEvent::Steer(value) => Some(*value),
            _ => None,
        })
    }
}

impl GamepadSink for RecordingGamepad {
    fn set_steer_axis(&mut self, value: i16) -> SinkResult<()> {
        self.events.push(PadEvent::Steer(value));
        Ok(())
    }

    fn set_throttle(&mut self, value: u8) -> SinkResult<()> {
        self.events.push(PadEvent::Throttle(value));
        Ok(())
    }

    fn set_brake(&mut self, value: u8) -> SinkResult<()> {
        self.events.push(PadEvent::Brake(value));
        Ok(())
    }

    fn press(&mut self, button: PadButton) -> SinkResult<()> {
        self.events.push(PadEvent::Press(button));
        Ok(())
    }

    fn release(&mut self, button: PadButton) -> SinkResult<()> {
        self.events.push(PadEvent::Release(button));
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.events.push(PadEvent::Flush);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingKeyboard {
    pub events: Vec<KeyEvent>,
}

impl RecordingKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, KeyEvent::Press(_)))
            .count()
    }

    pub fn release_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, KeyEvent::Release(_)))
            .count()
    }
}

impl KeyboardSink for RecordingKeyboard {
    fn press_key(&mut self, key: &str) -> SinkResult<()> {
        self.events.push(KeyEvent::Press(key.to_string()));
        Ok(())
    }

    fn release_key(&mut self, key: &str) -> SinkResult<()> {
        self.events.push(KeyEvent::Release(key.to_string()));
        Ok(())
    }
}

// ── Tracing-backed sinks ─────────────────────────────────────────────────

/// Stand-in gamepad that logs staged values instead of driving a real
/// virtual device. Used when no driver backend is wired up.
#[derive(Debug, Default)]
pub struct TracingGamepad;

impl GamepadSink for TracingGamepad {
    fn set_steer_axis(&mut self, value: i16) -> SinkResult<()> {
        debug!(value, "gamepad steer axis");
        Ok(())
    }

    fn set_throttle(&mut self, value: u8) -> SinkResult<()> {
        debug!(value, "gamepad throttle trigger");
        Ok(())
    }

    fn set_brake(&mut self, value: u8) -> SinkResult<()> {
        debug!(value, "gamepad brake trigger");
        Ok(())
    }

    fn press(&mut self, button: PadButton) -> SinkResult<()> {
        debug!(?button, "gamepad press");
        Ok(())
    }

    fn release(&mut self, button: PadButton) -> SinkResult<()> {
        debug!(?button, "gamepad release");
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TracingKeyboard;

impl KeyboardSink for TracingKeyboard {
    fn press_key(&mut self, key: &str) -> SinkResult<()> {
        debug!(key, "keyboard press");
        Ok(())
    }

    fn release_key(&mut self, key: &str) -> SinkResult<()> {
        debug!(key, "keyboard release");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_gamepad_preserves_order() -> SinkResult<()> {
        let mut pad = RecordingGamepad::new();
        pad.press(PadButton::A)?;
        pad.flush()?;
        pad.release(PadButton::A)?;
        assert_eq!(
            pad.events,
            vec![
                PadEvent::Press(PadButton::A),
                PadEvent::Flush,
                PadEvent::Release(PadButton::A),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_recording_keyboard_counts() -> SinkResult<()> {
        let mut kb = RecordingKeyboard::new();
        kb.press_key("space")?;
        kb.press_key("1")?;
        kb.release_key("space")?;
        assert_eq!(kb.press_count(), 2);
        assert_eq!(kb.release_count(), 1);
        Ok(())
    }
}
