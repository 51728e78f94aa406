//! ASCII line protocol for the SimBox rig serial link.
//!
//! Both directions of the wire share the same shape: one report per line,
//! `-`-delimited fields, `\n`-terminated.
//!
//! Inbound (rig → host), canonical grammar:
//!
//! ```text
//! <angle>-<throttle>-<brake>-<bits16>-<reset>[-<handbrake>[-<gx>-<gy>]]
//! ```
//!
//! Trailing fields may be absent on older firmware and default to
//! off/absent; anything else that does not parse drops the whole line.
//! The retired one-hot `gear6` field of early firmware is not parsed;
//! rigs still emitting it must be reflashed before pairing with this host.
//!
//! Outbound (host → rig) status frames carry G-forces, attitude, speed,
//! gear, rpm, curb state and force-feedback levels; see [`status`].

pub mod report;
pub mod status;

pub use report::{BUTTON_COUNT, InputReport, decode_report};
pub use status::{StatusFrame, decode_status, encode_status};

use thiserror::Error;

/// Field separator shared by both wire directions.
pub const FIELD_SEP: char = '-';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("empty line")]
    Empty,

    #[error("unexpected field count: {0}")]
    FieldCount(usize),

    #[error("field `{field}` is not a valid non-negative number: {raw:?}")]
    BadNumber { field: &'static str, raw: String },

    #[error("button field must be 16 binary digits, got {0:?}")]
    BadButtonField(String),

    #[error("flag field `{field}` must be 0 or 1, got {raw:?}")]
    BadFlag { field: &'static str, raw: String },
}

pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_field_count() {
        let err = WireError::FieldCount(7);
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_error_display_bad_number() {
        let err = WireError::BadNumber {
            field: "throttle",
            raw: "abc".to_string(),
        };
        assert!(err.to_string().contains("throttle"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_error_display_bad_button_field() {
        let err = WireError::BadButtonField("0101".to_string());
        assert!(!err.to_string().is_empty());
    }
}
