//! Outbound status frames (host → rig).
//!
//! Field order is fixed:
//!
//! ```text
//! gx-gy-gz-yaw-pitch-roll-speed-gear-rpm-onCurb-curbSide-rumble-pwmLeft-pwmRight\n
//! ```
//!
//! Floats carry exactly three decimals so the firmware's fixed-width
//! tokenizer never sees a varying field shape; everything else is a bare
//! integer. `curb_side` is -1 (left), 0 (center/unknown) or 1 (right).

use crate::{FIELD_SEP, WireError, WireResult};

const STATUS_FIELDS: usize = 14;

/// One outbound frame, ready for the wire. Integer sub-fields are already
/// clamped to a byte by construction; `gear` and `curb_side` keep their
/// native signed ranges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusFrame {
    pub g_lat: f32,
    pub g_lon: f32,
    pub g_vert: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: u8,
    pub gear: i8,
    pub rpm: u8,
    pub on_curb: bool,
    pub curb_side: i8,
    pub rumble: u8,
    pub pwm_left: u8,
    pub pwm_right: u8,
}

/// Serializes a frame as one newline-terminated wire line.
pub fn encode_status(frame: &StatusFrame) -> String {
    format!(
        "{:.3}-{:.3}-{:.3}-{:.3}-{:.3}-{:.3}-{}-{}-{}-{}-{}-{}-{}-{}\n",
        frame.g_lat,
        frame.g_lon,
        frame.g_vert,
        frame.yaw,
        frame.pitch,
        frame.roll,
        frame.speed,
        frame.gear,
        frame.rpm,
        u8::from(frame.on_curb),
        frame.curb_side,
        frame.rumble,
        frame.pwm_left,
        frame.pwm_right,
    )
}

/// Parses a status line back into a frame.
///
/// The firmware has its own C parser for this grammar; this decoder keeps
/// the two ends honest and backs the round-trip tests.
pub fn decode_status(line: &str) -> WireResult<StatusFrame> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Empty);
    }

    // Sign-aware split: a '-' directly after a separator (or at the start)
    // belongs to the next token, not the grammar.
    let tokens = split_signed(line);
    if tokens.len() != STATUS_FIELDS {
        return Err(WireError::FieldCount(tokens.len()));
    }

    Ok(StatusFrame {
        g_lat: parse_f32("gx", &tokens[0])?,
        g_lon: parse_f32("gy", &tokens[1])?,
        g_vert: parse_f32("gz", &tokens[2])?,
        yaw: parse_f32("yaw", &tokens[3])?,
        pitch: parse_f32("pitch", &tokens[4])?,
        roll: parse_f32("roll", &tokens[5])?,
        speed: parse_int("speed", &tokens[6])?,
        gear: parse_int("gear", &tokens[7])?,
        rpm: parse_int("rpm", &tokens[8])?,
        on_curb: match tokens[9].as_str() {
            "0" => false,
            "1" => true,
            other => {
                return Err(WireError::BadFlag {
                    field: "onCurb",
                    raw: other.to_string(),
                });
            }
        },
        curb_side: parse_int("curbSide", &tokens[10])?,
        rumble: parse_int("rumble", &tokens[11])?,
        pwm_left: parse_int("pwmLeft", &tokens[12])?,
        pwm_right: parse_int("pwmRight", &tokens[13])?,
    })
}

fn split_signed(line: &str) -> Vec<String> {
    let mut tokens = Vec::with_capacity(STATUS_FIELDS);
    let mut current = String::new();
    for ch in line.chars() {
        if ch == FIELD_SEP && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_f32(field: &'static str, raw: &str) -> WireResult<f32> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| WireError::BadNumber {
            field,
            raw: raw.to_string(),
        })
}

fn parse_int<T: std::str::FromStr>(field: &'static str, raw: &str) -> WireResult<T> {
    raw.parse::<T>().map_err(|_| WireError::BadNumber {
        field,
        raw: raw.to_string(),
    })
}
