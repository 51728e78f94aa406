//! Input translation for the SimBox rig.
//!
//! Takes fully-parsed [`simbox_wire::InputReport`]s and drives two abstract
//! sinks: a virtual gamepad (steering axis, two trigger axes, discrete
//! buttons) and a simulated keyboard (handbrake and H-pattern gear keys).
//! The concrete vigem/uinput backends live outside this crate; everything
//! here is testable against in-memory recorders.
//!
//! Translation is split in two phases so the orchestrator never holds a
//! lock across the button-hold window: [`InputTranslator::plan`] mutates
//! the shared [`ControllerState`] synchronously and returns a [`SinkPlan`];
//! [`InputTranslator::execute`] performs the planned sink effects,
//! including the timed instantaneous-button batch.

pub mod sinks;
pub mod state;
pub mod steering;
pub mod translator;

pub use sinks::{
    GamepadSink, KeyEvent, KeyboardSink, PadButton, PadEvent, RecordingGamepad,
    RecordingKeyboard, SinkError, SinkResult, TracingGamepad, TracingKeyboard,
};
pub use state::ControllerState;
pub use steering::SteeringConfig;
pub use translator::{
    ButtonMap, GearshiftConfig, HandbrakeConfig, HandbrakeMode, InputTranslator, KeyEdge,
    SinkPlan, TranslatorConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type InputResult<T> = Result<T, InputError>;
