//! Inbound report parsing (rig → host).

use crate::{FIELD_SEP, WireError, WireResult};

/// Number of discrete rig buttons carried per report.
pub const BUTTON_COUNT: usize = 16;

/// Accepted field counts for the inbound grammar.
///
/// 5 = legacy (angle, throttle, brake, buttons, reset),
/// 6 = + handbrake, 8 = + gear axis pair.
const FIELDS_LEGACY: usize = 5;
const FIELDS_HANDBRAKE: usize = 6;
const FIELDS_GEAR_AXES: usize = 8;

/// One fully-parsed input line. Built fresh per line and consumed
/// immediately by the translator.
#[derive(Debug, Clone, PartialEq)]
pub struct InputReport {
    /// Steering angle in degrees; the only signed field on the wire.
    pub steer_angle_deg: f32,
    pub throttle: u8,
    pub brake: u8,
    pub buttons: [bool; BUTTON_COUNT],
    pub reset: bool,
    /// Absent on legacy firmware; defaults to released.
    pub handbrake: bool,
    /// Raw H-shifter axis samples `(gx, gy)`; absent on firmware without
    /// the gearstick harness.
    pub gear_axes: Option<(u8, u8)>,
}

/// Parses one inbound line into an [`InputReport`].
///
/// Whitespace is trimmed first. Any unparsable field rejects the whole
/// line; callers are expected to log the error and move on to the next
/// line rather than abort.
pub fn decode_report(line: &str) -> WireResult<InputReport> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Empty);
    }

    // The separator doubles as the sign of the steering angle, which is
    // the only field allowed to be negative and always comes first.
    let (angle_negative, body) = match line.strip_prefix(FIELD_SEP) {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let fields: Vec<&str> = body.split(FIELD_SEP).collect();
    match fields.len() {
        FIELDS_LEGACY | FIELDS_HANDBRAKE | FIELDS_GEAR_AXES => {}
        n => return Err(WireError::FieldCount(n)),
    }

    let magnitude = parse_f32("angle", fields[0])?;
    let steer_angle_deg = if angle_negative { -magnitude } else { magnitude };

    let throttle = parse_byte("throttle", fields[1])?;
    let brake = parse_byte("brake", fields[2])?;
    let buttons = parse_buttons(fields[3])?;
    let reset = parse_flag("reset", fields[4])?;

    let handbrake = if fields.len() >= FIELDS_HANDBRAKE {
        parse_flag("handbrake", fields[5])?
    } else {
        false
    };

    let gear_axes = if fields.len() == FIELDS_GEAR_AXES {
        Some((parse_byte("gx", fields[6])?, parse_byte("gy", fields[7])?))
    } else {
        None
    };

    Ok(InputReport {
        steer_angle_deg,
        throttle,
        brake,
        buttons,
        reset,
        handbrake,
        gear_axes,
    })
}

fn parse_f32(field: &'static str, raw: &str) -> WireResult<f32> {
    // Signs were consumed by the splitter, so a stray one here means a
    // negative interior field: reject.
    if raw.is_empty() || raw.starts_with('+') || raw.starts_with('-') {
        return Err(bad_number(field, raw));
    }
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| bad_number(field, raw))
}

/// Integer field constrained to a byte. The rig's ADCs are 8-bit, but a
/// glitched oversized sample clamps rather than dropping the line, which
/// matches the firmware-side parser.
fn parse_byte(field: &'static str, raw: &str) -> WireResult<u8> {
    let value = raw
        .parse::<u32>()
        .map_err(|_| bad_number(field, raw))?;
    Ok(u8::try_from(value.min(255)).unwrap_or(u8::MAX))
}

fn parse_flag(field: &'static str, raw: &str) -> WireResult<bool> {
    match raw {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(WireError::BadFlag {
            field,
            raw: raw.to_string(),
        }),
    }
}

fn parse_buttons(raw: &str) -> WireResult<[bool; BUTTON_COUNT]> {
    if raw.len() != BUTTON_COUNT {
        return Err(WireError::BadButtonField(raw.to_string()));
    }
    let mut buttons = [false; BUTTON_COUNT];
    for (slot, ch) in buttons.iter_mut().zip(raw.chars()) {
        *slot = match ch {
            '0' => false,
            '1' => true,
            _ => return Err(WireError::BadButtonField(raw.to_string())),
        };
    }
    Ok(buttons)
}

fn bad_number(field: &'static str, raw: &str) -> WireError {
    WireError::BadNumber {
        field,
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_BUTTONS: &str = "0000000000000000";

    #[test]
    fn test_decode_legacy_five_fields() -> WireResult<()> {
        let report = decode_report("12.5-200-0-0000000000000001-0")?;
        assert!((report.steer_angle_deg - 12.5).abs() < f32::EPSILON);
        assert_eq!(report.throttle, 200);
        assert_eq!(report.brake, 0);
        assert!(report.buttons[15]);
        assert!(!report.reset);
        assert!(!report.handbrake);
        assert_eq!(report.gear_axes, None);
        Ok(())
    }

    #[test]
    fn test_decode_six_fields_handbrake() -> WireResult<()> {
        let report = decode_report(&format!("0-0-0-{NO_BUTTONS}-0-1"))?;
        assert!(report.handbrake);
        assert_eq!(report.gear_axes, None);
        Ok(())
    }

    #[test]
    fn test_decode_full_eight_fields() -> WireResult<()> {
        let report = decode_report("10.0-128-0-0000000000000000-0-0-120-150")?;
        assert!((report.steer_angle_deg - 10.0).abs() < f32::EPSILON);
        assert_eq!(report.throttle, 128);
        assert_eq!(report.brake, 0);
        assert_eq!(report.buttons, [false; BUTTON_COUNT]);
        assert!(!report.reset);
        assert!(!report.handbrake);
        assert_eq!(report.gear_axes, Some((120, 150)));
        Ok(())
    }

    #[test]
    fn test_decode_negative_angle() -> WireResult<()> {
        let report = decode_report(&format!("-33.25-0-0-{NO_BUTTONS}-0"))?;
        assert!((report.steer_angle_deg + 33.25).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn test_decode_trims_whitespace() -> WireResult<()> {
        let report = decode_report(&format!("  1.0-2-3-{NO_BUTTONS}-0 \r"))?;
        assert_eq!(report.brake, 3);
        Ok(())
    }

    #[test]
    fn test_decode_rejects_seven_fields() {
        let line = format!("1.0-0-0-{NO_BUTTONS}-0-0-120");
        assert_eq!(decode_report(&line), Err(WireError::FieldCount(7)));
    }

    #[test]
    fn test_decode_rejects_short_line() {
        assert_eq!(decode_report("1.0-0-0"), Err(WireError::FieldCount(3)));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert_eq!(decode_report("   "), Err(WireError::Empty));
    }

    #[test]
    fn test_decode_rejects_garbage_throttle() {
        let line = format!("1.0-full-0-{NO_BUTTONS}-0");
        assert!(matches!(
            decode_report(&line),
            Err(WireError::BadNumber { field: "throttle", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_negative_interior_field() {
        // Interior negatives produce an empty token after the split.
        let line = format!("1.0--5-0-{NO_BUTTONS}-0");
        assert!(decode_report(&line).is_err());
    }

    #[test]
    fn test_decode_clamps_oversized_byte_field() -> WireResult<()> {
        let report = decode_report(&format!("0-300-999-{NO_BUTTONS}-0"))?;
        assert_eq!(report.throttle, 255);
        assert_eq!(report.brake, 255);
        Ok(())
    }

    #[test]
    fn test_decode_rejects_short_button_field() {
        assert!(matches!(
            decode_report("1.0-0-0-0101-0"),
            Err(WireError::BadButtonField(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_binary_button_field() {
        assert!(matches!(
            decode_report("1.0-0-0-00000000000000a0-0"),
            Err(WireError::BadButtonField(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_flag() {
        let line = format!("1.0-0-0-{NO_BUTTONS}-2");
        assert!(matches!(decode_report(&line), Err(WireError::BadFlag { .. })));
    }

    #[test]
    fn test_decode_reset_flag() -> WireResult<()> {
        let report = decode_report(&format!("0-0-0-{NO_BUTTONS}-1"))?;
        assert!(report.reset);
        Ok(())
    }
}
