//! Orchestration of the rig ↔ PC serial bridge.
//!
//! Three concurrent loops share one [`simbox_input::ControllerState`]:
//! the reader loop decodes inbound report lines and applies them through
//! the translator, the axis loop re-pushes the continuous axes every
//! 10 ms so the virtual pad never goes stale, and the telemetry loop
//! polls the game source and writes a status frame back down the serial
//! link every 50 ms. Decode and sink failures inside the loops are
//! logged and skipped; only startup (device open, source start) is
//! allowed to be fatal.
//!
//! The `simboxd` binary wires this up against a real serial device node;
//! the integration tests drive it over `tokio::io::duplex` instead.

pub mod bridge;
pub mod config;

pub use bridge::Bridge;
pub use config::{BridgeConfig, SourceKind, TelemetryConfig};
