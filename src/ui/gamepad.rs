/// Gamepad input and rumble using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move pointer / grid cursor
///   A / R1 / R2           →  Point
///   A / Start             →  Confirm
///   B / Select            →  Back
///   Start                 →  Pause
///
/// Rumble is the haptic channel for hot/cold feedback. Pads without
/// force feedback (or builds without the `gamepad` feature) ignore it.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Replay, Ticks};
#[cfg(feature = "gamepad")]
use tracing::{debug, info};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    point: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    pause: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            point:   vec![Btn::A, Btn::R1, Btn::R2],
            confirm: vec![Btn::A, Btn::Start],
            cancel:  vec![Btn::B, Btn::Select],
            pause:   vec![Btn::Start],
        }
    }
}

/// Direction pad merged from D-pad and left stick.
#[derive(Clone, Copy, Debug, Default)]
struct Dirs {
    up: BtnState,
    down: BtnState,
    left: BtnState,
    right: BtnState,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    /// Current rumble; dropping an `Effect` stops it.
    #[cfg(feature = "gamepad")]
    rumble: Option<Effect>,

    buttons: [BtnState; 10],
    dpad: Dirs,
    stick: Dirs,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    info!(error = %e, "gamepad support unavailable");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            #[cfg(feature = "gamepad")]
            rumble: None,
            buttons: [BtnState::default(); 10],
            dpad: Dirs::default(),
            stick: Dirs::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; an
    /// action with no valid names keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() { *slot = parsed; }
        }
        let map = &mut self.action_map;
        apply(&mut map.point, &cfg.point);
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.cancel, &cfg.cancel);
        apply(&mut map.pause, &cfg.pause);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Stick → digital directions
        let prev = self.stick;
        self.stick.left.held = self.stick_x < -STICK_DEADZONE;
        self.stick.right.held = self.stick_x > STICK_DEADZONE;
        self.stick.up.held = self.stick_y > STICK_DEADZONE;
        self.stick.down.held = self.stick_y < -STICK_DEADZONE;

        if self.stick.left.held && !prev.left.held { self.stick.left.just_pressed = true; }
        if self.stick.right.held && !prev.right.held { self.stick.right.just_pressed = true; }
        if self.stick.up.held && !prev.up.held { self.stick.up.just_pressed = true; }
        if self.stick.down.held && !prev.down.held { self.stick.down.just_pressed = true; }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(&mut self.dpad.up),
            Button::DPadDown  => Some(&mut self.dpad.down),
            Button::DPadLeft  => Some(&mut self.dpad.left),
            Button::DPadRight => Some(&mut self.dpad.right),
            _ => None,
        };
        if let Some(state) = dir {
            state.held = held;
            if held { state.just_pressed = true; }
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let state = &mut self.buttons[btn_index(btn)];
            state.held = held;
            if held { state.just_pressed = true; }
        }
    }

    // ── Rumble ──

    /// Best-effort strong-motor pulse on every force-feedback pad.
    /// `intensity` is 0..1.
    #[cfg(feature = "gamepad")]
    pub fn rumble(&mut self, intensity: f32, duration_ms: u32) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };
        let pads: Vec<_> = gilrs.gamepads()
            .filter(|(_, pad)| pad.is_ff_supported())
            .map(|(id, _)| id)
            .collect();
        if pads.is_empty() || intensity <= 0.0 { return; }

        let magnitude = (intensity.clamp(0.0, 1.0) * u16::MAX as f32) as u16;
        let built = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong { magnitude },
                scheduling: Replay { play_for: Ticks::from_ms(duration_ms), ..Default::default() },
                envelope: Default::default(),
            })
            .gamepads(&pads)
            .finish(gilrs);

        match built {
            Ok(effect) => {
                if let Err(e) = effect.play() {
                    debug!(error = %e, "rumble failed to play");
                }
                self.rumble = Some(effect);
            }
            Err(e) => debug!(error = %e, "rumble effect rejected"),
        }
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn rumble(&mut self, _intensity: f32, _duration_ms: u32) {}

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn point_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.point)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }

    // Held (pointer movement)
    pub fn up_held(&self) -> bool { self.dpad.up.held || self.stick.up.held }
    pub fn down_held(&self) -> bool { self.dpad.down.held || self.stick.down.held }
    pub fn left_held(&self) -> bool { self.dpad.left.held || self.stick.left.held }
    pub fn right_held(&self) -> bool { self.dpad.right.held || self.stick.right.held }

    // Edge (grid cursor)
    pub fn up_pressed(&self) -> bool { self.dpad.up.just_pressed || self.stick.up.just_pressed }
    pub fn down_pressed(&self) -> bool { self.dpad.down.just_pressed || self.stick.down.just_pressed }
    pub fn left_pressed(&self) -> bool { self.dpad.left.just_pressed || self.stick.left.just_pressed }
    pub fn right_pressed(&self) -> bool { self.dpad.right.just_pressed || self.stick.right.just_pressed }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        for d in [&mut self.dpad, &mut self.stick] {
            d.up.just_pressed = false;
            d.down.just_pressed = false;
            d.left.just_pressed = false;
            d.right.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); 10];
        self.dpad = Dirs::default();
        self.stick = Dirs::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_case_insensitive() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rt"), Some(Btn::R2));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_and_keeps_defaults() {
        let mut pad = GamepadState::new();
        let cfg = GamepadConfig {
            point: vec!["X".into()],
            confirm: vec!["nonsense".into()],
            cancel: vec![],
            pause: vec!["Select".into(), "Start".into()],
        };
        pad.load_button_config(&cfg);
        assert_eq!(pad.action_map.point, vec![Btn::X]);
        assert_eq!(pad.action_map.confirm, ActionMap::default().confirm);
        assert_eq!(pad.action_map.cancel, ActionMap::default().cancel);
        assert_eq!(pad.action_map.pause, vec![Btn::Select, Btn::Start]);
    }

    #[test]
    fn nothing_pressed_initially() {
        let pad = GamepadState::new();
        assert!(!pad.point_pressed());
        assert!(!pad.pause_pressed());
        assert!(!pad.up_held());
    }
}
