//! Steering angle to axis-value mapping.

use serde::{Deserialize, Serialize};

/// Steering pipeline parameters. The stages run strictly in the order
/// deadzone → gain → clamp → rescale; gain applied first would scale the
/// jitter band past the deadzone threshold and defeat it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SteeringConfig {
    /// Angles below this magnitude are treated as exactly centered.
    pub deadzone_deg: f32,
    /// Sensitivity multiplier; 1.0 maps the physical range 1:1.
    pub gain: f32,
    pub min_deg: f32,
    pub max_deg: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            deadzone_deg: 0.5,
            gain: 5.0,
            min_deg: -450.0,
            max_deg: 450.0,
        }
    }
}

impl SteeringConfig {
    /// Maps a decoded angle in degrees onto the signed 16-bit stick axis.
    pub fn axis_value(&self, angle_deg: f32) -> i16 {
        let gated = if angle_deg.abs() < self.deadzone_deg {
            0.0
        } else {
            angle_deg
        };
        let scaled = (gated * self.gain).clamp(self.min_deg, self.max_deg);
        let norm = (scaled - self.min_deg) / (self.max_deg - self.min_deg);
        let value = (norm * 65535.0).round() as i32 - 32768;
        value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_axis_center() {
        let cfg = SteeringConfig::default();
        assert_eq!(cfg.axis_value(0.0), 0);
    }

    #[test]
    fn test_deadzone_forces_exact_center() {
        let cfg = SteeringConfig::default();
        let center = cfg.axis_value(0.0);
        assert_eq!(cfg.axis_value(0.49), center);
        assert_eq!(cfg.axis_value(-0.49), center);
        assert_ne!(cfg.axis_value(0.5), center);
    }

    #[test]
    fn test_ten_degrees_at_gain_five() {
        // round(((10*5 + 450) / 900) * 65535) - 32768
        let cfg = SteeringConfig::default();
        assert_eq!(cfg.axis_value(10.0), 3640);
    }

    #[test]
    fn test_range_clamp_saturates() {
        let cfg = SteeringConfig::default();
        assert_eq!(cfg.axis_value(200.0), cfg.axis_value(90.0));
        assert_eq!(cfg.axis_value(90.0), 32767);
        assert_eq!(cfg.axis_value(-90.0), i16::MIN);
        assert_eq!(cfg.axis_value(-500.0), i16::MIN);
    }

    #[test]
    fn test_deadzone_applies_before_gain() {
        // At gain 100 a 0.4° wobble would swing hard without the
        // deadzone-first ordering.
        let cfg = SteeringConfig {
            gain: 100.0,
            ..SteeringConfig::default()
        };
        assert_eq!(cfg.axis_value(0.4), cfg.axis_value(0.0));
    }
}
