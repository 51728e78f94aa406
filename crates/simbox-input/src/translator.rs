//! Report-to-sink translation with debounce/edge semantics.

use crate::sinks::{GamepadSink, KeyboardSink, PadButton};
use crate::state::ControllerState;
use crate::steering::SteeringConfig;
use crate::{InputResult, SinkResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use simbox_shifter::{GearGrid, ShifterResult};
use simbox_wire::InputReport;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Rig button index → pad button. Unmapped indices are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonMap(pub HashMap<u8, PadButton>);

impl Default for ButtonMap {
    fn default() -> Self {
        // Matches the rig's front-panel wiring.
        Self(HashMap::from([
            (0, PadButton::Start),
            (1, PadButton::A),
            (5, PadButton::X),
            (6, PadButton::DpadRight),
            (7, PadButton::DpadLeft),
            (9, PadButton::DpadUp),
            (10, PadButton::DpadDown),
        ]))
    }
}

/// Handbrake key semantics across firmware generations.
///
/// `PressOnly` is canonical: the 0→1 edge fires a key-down and the game is
/// responsible for whatever release semantics it wants.
/// `HoldWhileEngaged` reproduces the earlier behavior where the key stays
/// down exactly as long as the bit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandbrakeMode {
    #[default]
    PressOnly,
    HoldWhileEngaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HandbrakeConfig {
    pub enabled: bool,
    pub mode: HandbrakeMode,
    pub key: String,
}

impl Default for HandbrakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: HandbrakeMode::PressOnly,
            key: "space".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GearshiftConfig {
    pub enabled: bool,
    pub grid: GearGrid,
    /// Gear index → key name. Index 6 is reverse.
    pub keys: BTreeMap<u8, String>,
}

impl Default for GearshiftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid: GearGrid::default(),
            keys: (1..=6).map(|gear| (gear, gear.to_string())).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct TranslatorConfig {
    pub steering: SteeringConfig,
    /// Hold window for the instantaneous button batch, in milliseconds.
    pub button_hold_ms: u64,
    pub buttons: ButtonMap,
    pub handbrake: HandbrakeConfig,
    pub gearshift: GearshiftConfig,
}

impl TranslatorConfig {
    pub fn validate(&self) -> ShifterResult<()> {
        self.gearshift.grid.validate()
    }

    fn button_hold(&self) -> Duration {
        Duration::from_millis(if self.button_hold_ms == 0 {
            80
        } else {
            self.button_hold_ms
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Press,
    Release,
}

/// Sink effects planned from one report, performed in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkPlan {
    /// Reset: push zeroed axes/triggers ahead of the next periodic tick.
    pub zero_axes: bool,
    /// Reset while the handbrake key was held down.
    pub release_handbrake: bool,
    /// Instantaneous batch; one shared hold window for the whole line.
    pub press_buttons: Vec<PadButton>,
    pub handbrake: Option<KeyEdge>,
    /// Key fired once on a latched gear change into a mapped gate.
    pub gear_key: Option<String>,
}

impl SinkPlan {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Stateless translator; all mutable state lives in [`ControllerState`].
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    config: TranslatorConfig,
}

impl InputTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Phase one: fold the report into the shared state and decide which
    /// sink effects it triggers. Synchronous so callers can run it under
    /// the state lock.
    pub fn plan(&self, report: &InputReport, state: &mut ControllerState) -> SinkPlan {
        let mut plan = SinkPlan::default();

        state.throttle = report.throttle;
        state.brake = report.brake;
        state.steer_angle_deg = report.steer_angle_deg;

        if report.reset {
            plan.zero_axes = true;
            plan.release_handbrake =
                state.handbrake_held && self.config.handbrake.mode == HandbrakeMode::HoldWhileEngaged;
            state.reset();
            debug!("rig reset: state zeroed");
        }

        plan.press_buttons = report
            .buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .filter_map(|(index, _)| self.config.buttons.0.get(&(index as u8)).copied())
            .collect();
        if !plan.press_buttons.is_empty() {
            debug!(buttons = ?plan.press_buttons, "instant button batch");
        }

        if self.config.handbrake.enabled && report.handbrake != state.handbrake_held {
            plan.handbrake = match (report.handbrake, self.config.handbrake.mode) {
                (true, _) => Some(KeyEdge::Press),
                (false, HandbrakeMode::HoldWhileEngaged) => Some(KeyEdge::Release),
                (false, HandbrakeMode::PressOnly) => None,
            };
            state.handbrake_held = report.handbrake;
            debug!(engaged = report.handbrake, "handbrake edge");
        }

        if self.config.gearshift.enabled
            && let Some((gx, gy)) = report.gear_axes
        {
            let gate = self.config.gearshift.grid.decode(gx, gy);
            if gate.gear != state.current_gear {
                if !gate.gear.is_neutral() {
                    plan.gear_key = self.config.gearshift.keys.get(&gate.gear.index).cloned();
                }
                debug!(
                    from = state.current_gear.index,
                    to = gate.gear.index,
                    row = ?gate.row,
                    col = ?gate.col,
                    "gear change"
                );
                state.current_gear = gate.gear;
            }
        }

        plan
    }

    /// Phase two: perform the planned effects. The gamepad sits behind a
    /// mutex because the periodic axis push shares it; the lock is never
    /// held across the hold window.
    pub async fn execute<G, K>(
        &self,
        plan: &SinkPlan,
        gamepad: &Mutex<G>,
        keyboard: &Mutex<K>,
    ) -> InputResult<()>
    where
        G: GamepadSink,
        K: KeyboardSink,
    {
        if plan.zero_axes {
            let center = self.config.steering.axis_value(0.0);
            let mut pad = gamepad.lock();
            pad.set_steer_axis(center)?;
            pad.set_throttle(0)?;
            pad.set_brake(0)?;
            pad.flush()?;
        }

        if plan.release_handbrake {
            keyboard.lock().release_key(&self.config.handbrake.key)?;
        }

        if !plan.press_buttons.is_empty() {
            press_batch(gamepad, &plan.press_buttons)?;
            tokio::time::sleep(self.config.button_hold()).await;
            release_batch(gamepad, &plan.press_buttons)?;
        }

        match plan.handbrake {
            Some(KeyEdge::Press) => keyboard.lock().press_key(&self.config.handbrake.key)?,
            Some(KeyEdge::Release) => keyboard.lock().release_key(&self.config.handbrake.key)?,
            None => {}
        }

        if let Some(key) = &plan.gear_key {
            keyboard.lock().press_key(key)?;
        }

        Ok(())
    }

    /// Convenience wrapper used by the bridge's reader loop.
    pub async fn apply<G, K>(
        &self,
        report: &InputReport,
        state: &Mutex<ControllerState>,
        gamepad: &Mutex<G>,
        keyboard: &Mutex<K>,
    ) -> InputResult<()>
    where
        G: GamepadSink,
        K: KeyboardSink,
    {
        let plan = {
            let mut state = state.lock();
            self.plan(report, &mut state)
        };
        self.execute(&plan, gamepad, keyboard).await
    }

    /// Periodic push of the continuous axes from a state snapshot.
    pub fn push_axes<G: GamepadSink>(
        &self,
        snapshot: &ControllerState,
        gamepad: &mut G,
    ) -> SinkResult<()> {
        gamepad.set_steer_axis(self.config.steering.axis_value(snapshot.steer_angle_deg))?;
        gamepad.set_throttle(snapshot.throttle)?;
        gamepad.set_brake(snapshot.brake)?;
        gamepad.flush()
    }
}

fn press_batch<G: GamepadSink>(gamepad: &Mutex<G>, buttons: &[PadButton]) -> InputResult<()> {
    let mut pad = gamepad.lock();
    for button in buttons {
        pad.press(*button)?;
    }
    pad.flush()?;
    Ok(())
}

fn release_batch<G: GamepadSink>(gamepad: &Mutex<G>, buttons: &[PadButton]) -> InputResult<()> {
    let mut pad = gamepad.lock();
    for button in buttons {
        pad.release(*button)?;
    }
    pad.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{KeyEvent, PadEvent, RecordingGamepad, RecordingKeyboard};
    use simbox_wire::decode_report;

    fn report(line: &str) -> InputReport {
        match decode_report(line) {
            Ok(report) => report,
            Err(err) => panic!("test line rejected: {err}"),
        }
    }

    fn translator() -> InputTranslator {
        InputTranslator::new(TranslatorConfig::default())
    }

    const NO_BUTTONS: &str = "0000000000000000";

    #[test]
    fn test_default_config_validates() {
        assert!(TranslatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_plan_updates_axes_state() {
        let mut state = ControllerState::default();
        let plan = translator().plan(&report("15.5-128-64-0000000000000000-0"), &mut state);
        assert_eq!(state.throttle, 128);
        assert_eq!(state.brake, 64);
        assert!((state.steer_angle_deg - 15.5).abs() < f32::EPSILON);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_maps_buttons_and_skips_unmapped() {
        let mut state = ControllerState::default();
        // bits 0 (Start), 1 (A) and 2 (unmapped) set
        let plan = translator().plan(&report("0-0-0-1110000000000000-0"), &mut state);
        assert_eq!(plan.press_buttons, vec![PadButton::Start, PadButton::A]);
    }

    #[test]
    fn test_reset_zeroes_state_before_button_logic() {
        let mut state = ControllerState {
            throttle: 250,
            handbrake_held: true,
            ..ControllerState::default()
        };
        let plan = translator().plan(&report("90.0-200-10-0100000000000000-1"), &mut state);
        assert!(plan.zero_axes);
        assert_eq!(state.throttle, 0);
        assert_eq!(state.brake, 0);
        assert!(state.steer_angle_deg.abs() < f32::EPSILON);
        assert!(!state.handbrake_held);
        assert!(state.current_gear.is_neutral());
        // the same line's buttons still fire after the reset
        assert_eq!(plan.press_buttons, vec![PadButton::A]);
    }

    #[test]
    fn test_handbrake_press_only_edge() {
        let translator = translator();
        let mut state = ControllerState::default();

        let low = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0")), &mut state);
        assert_eq!(low.handbrake, None);

        let rising = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-1")), &mut state);
        assert_eq!(rising.handbrake, Some(KeyEdge::Press));

        // held: no further edge
        let held = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-1")), &mut state);
        assert_eq!(held.handbrake, None);

        // falling edge is silent in press-only mode
        let falling = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0")), &mut state);
        assert_eq!(falling.handbrake, None);
        assert!(!state.handbrake_held);
    }

    #[test]
    fn test_handbrake_hold_mode_releases() {
        let mut config = TranslatorConfig::default();
        config.handbrake.mode = HandbrakeMode::HoldWhileEngaged;
        let translator = InputTranslator::new(config);
        let mut state = ControllerState::default();

        let rising = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-1")), &mut state);
        assert_eq!(rising.handbrake, Some(KeyEdge::Press));
        let falling = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0")), &mut state);
        assert_eq!(falling.handbrake, Some(KeyEdge::Release));
    }

    #[test]
    fn test_handbrake_disabled_ignores_bit() {
        let mut config = TranslatorConfig::default();
        config.handbrake.enabled = false;
        let translator = InputTranslator::new(config);
        let mut state = ControllerState::default();
        let plan = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-1")), &mut state);
        assert_eq!(plan.handbrake, None);
        assert!(!state.handbrake_held);
    }

    #[test]
    fn test_gear_change_fires_key_once() {
        let translator = translator();
        let mut state = ControllerState::default();

        // fourth gear gate: gx center, gy down
        let shift = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0-120-150")), &mut state);
        assert_eq!(shift.gear_key.as_deref(), Some("4"));
        assert_eq!(state.current_gear.index, 4);

        // same gate again: latched, no key
        let same = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0-120-150")), &mut state);
        assert_eq!(same.gear_key, None);
    }

    #[test]
    fn test_gear_into_neutral_fires_nothing() {
        let translator = translator();
        let mut state = ControllerState::default();
        translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0-120-150")), &mut state);

        // gy in the row gap: neutral, latched silently
        let neutral = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0-120-125")), &mut state);
        assert_eq!(neutral.gear_key, None);
        assert!(state.current_gear.is_neutral());
    }

    #[test]
    fn test_gear_decode_disabled() {
        let mut config = TranslatorConfig::default();
        config.gearshift.enabled = false;
        let translator = InputTranslator::new(config);
        let mut state = ControllerState::default();
        let plan = translator.plan(&report(&format!("0-0-0-{NO_BUTTONS}-0-0-120-150")), &mut state);
        assert_eq!(plan.gear_key, None);
        assert!(state.current_gear.is_neutral());
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_button_batch_shares_one_hold_window() -> InputResult<()> {
        let translator = translator();
        let gamepad = Mutex::new(RecordingGamepad::new());
        let keyboard = Mutex::new(RecordingKeyboard::new());

        let plan = SinkPlan {
            press_buttons: vec![PadButton::Start, PadButton::A],
            ..SinkPlan::default()
        };
        translator.execute(&plan, &gamepad, &keyboard).await?;

        let events = gamepad.into_inner().events;
        assert_eq!(
            events,
            vec![
                PadEvent::Press(PadButton::Start),
                PadEvent::Press(PadButton::A),
                PadEvent::Flush,
                PadEvent::Release(PadButton::Start),
                PadEvent::Release(PadButton::A),
                PadEvent::Flush,
            ]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_reports_one_press_zero_releases() -> InputResult<()> {
        let translator = translator();
        let state = Mutex::new(ControllerState::default());
        let gamepad = Mutex::new(RecordingGamepad::new());
        let keyboard = Mutex::new(RecordingKeyboard::new());

        for line in [
            format!("0-0-0-{NO_BUTTONS}-0-0"),
            format!("0-0-0-{NO_BUTTONS}-0-1"),
        ] {
            translator
                .apply(&report(&line), &state, &gamepad, &keyboard)
                .await?;
        }

        let keyboard = keyboard.into_inner();
        assert_eq!(keyboard.events, vec![KeyEvent::Press("space".to_string())]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_reset_pushes_zeroed_axes_first() -> InputResult<()> {
        let translator = translator();
        let gamepad = Mutex::new(RecordingGamepad::new());
        let keyboard = Mutex::new(RecordingKeyboard::new());

        let plan = SinkPlan {
            zero_axes: true,
            press_buttons: vec![PadButton::A],
            ..SinkPlan::default()
        };
        translator.execute(&plan, &gamepad, &keyboard).await?;

        let events = gamepad.into_inner().events;
        assert_eq!(
            &events[..4],
            &[
                PadEvent::Steer(0),
                PadEvent::Throttle(0),
                PadEvent::Brake(0),
                PadEvent::Flush,
            ]
        );
        assert!(events.contains(&PadEvent::Press(PadButton::A)));
        Ok(())
    }

    #[test]
    fn test_push_axes_snapshot() -> SinkResult<()> {
        let translator = translator();
        let mut gamepad = RecordingGamepad::new();
        let snapshot = ControllerState {
            throttle: 128,
            brake: 0,
            steer_angle_deg: 10.0,
            ..ControllerState::default()
        };
        translator.push_axes(&snapshot, &mut gamepad)?;
        assert_eq!(
            gamepad.events,
            vec![
                PadEvent::Steer(3640),
                PadEvent::Throttle(128),
                PadEvent::Brake(0),
                PadEvent::Flush,
            ]
        );
        Ok(())
    }
}
