/// WorldState: everything the terminal front end shows.
///
/// The round rules live in `RoundController`; this is the scene around
/// it. It is the concrete target of the `Host` calls (via `ui::scene`)
/// and the source of pointer events fed back into the controller.
///
/// ## Field
///
///   - `width` x `height` cells, `cell_size_m` metres per cell.
///   - The viewer stands at the bottom centre; "ahead" is row 0.
///   - The pointer is a free cursor the player aims with.
///   - Distances reported to the controller are pointer-to-target,
///     in metres.
///
/// ## Screens
/// ┌─────────┬────────────────────────────────────────┐
/// │ Title    │ animal grid, select + start              │
/// │ Field    │ round in progress (or just won)          │
/// │ Paused   │ overlay, round kept in memory            │
/// │ Summary  │ win screen, play again or back           │
/// └─────────┴────────────────────────────────────────┘

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::FeedbackConfig;
use crate::domain::animal::Animal;
use crate::domain::placement::{cell_distance_m, Placement};
use crate::domain::proximity::Tier;
use super::event::{HostEvent, WinSummary};

pub const FIELD_W: usize = 30;
pub const FIELD_H: usize = 20;

/// How long the miss indicator stays up, in ticks.
pub const INDICATOR_TICKS: u32 = 24;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Title,
    Field,
    Paused,
    Summary,
}

#[derive(Clone, Debug)]
pub struct Target {
    pub animal_id: &'static str,
    pub glyph: &'static str,
    pub cell: (usize, usize),
    pub revealed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct Indicator {
    pub tier: Tier,
    pub timer: u32,
}

pub struct WorldState {
    pub screen: Screen,

    // ── Field ──
    pub width: usize,
    pub height: usize,
    pub cell_size_m: f32,
    pub viewer: (usize, usize),
    pub pointer: (usize, usize),
    pub move_cooldown: u32,
    pub target: Option<Target>,

    // ── HUD ──
    pub hud_tier: Option<Tier>,
    pub indicator: Option<Indicator>,
    pub summary: Option<WinSummary>,
    pub message: String,
    pub message_timer: u32,

    // ── Title ──
    pub select_cursor: usize,

    pub anim_tick: u32,
    sample_elapsed: Duration,
    rng: StdRng,
}

// ── Construction ──

impl WorldState {
    pub fn new(feedback: &FeedbackConfig) -> Self {
        Self::with_rng(feedback, StdRng::from_os_rng())
    }

    /// Deterministic placement (tests, replays).
    pub fn with_rng(feedback: &FeedbackConfig, rng: StdRng) -> Self {
        let viewer = (FIELD_W / 2, FIELD_H - 1);
        WorldState {
            screen: Screen::Title,
            width: FIELD_W,
            height: FIELD_H,
            cell_size_m: feedback.cell_size_m,
            viewer,
            pointer: home_pointer(viewer),
            move_cooldown: 0,
            target: None,
            hud_tier: None,
            indicator: None,
            summary: None,
            message: String::new(),
            message_timer: 0,
            select_cursor: 0,
            anim_tick: 0,
            sample_elapsed: Duration::ZERO,
            rng,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

/// Pointer starts a few cells ahead of the viewer.
fn home_pointer(viewer: (usize, usize)) -> (usize, usize) {
    (viewer.0, viewer.1.saturating_sub(3))
}

// ── Target ──

impl WorldState {
    /// Hide `animal` somewhere in front of the viewer and reset the
    /// round-local HUD.
    pub fn place_target(&mut self, animal: &Animal) {
        let placement = Placement::random(&mut self.rng);
        let cell = placement.to_cell(self.viewer, self.cell_size_m, self.width, self.height);
        self.target = Some(Target {
            animal_id: animal.id,
            glyph: animal.glyph,
            cell,
            revealed: false,
        });
        self.pointer = home_pointer(self.viewer);
        self.move_cooldown = 0;
        self.hud_tier = None;
        self.indicator = None;
        self.summary = None;
        self.sample_elapsed = Duration::ZERO;
        self.screen = Screen::Field;
    }

    pub fn set_revealed(&mut self, revealed: bool) {
        if let Some(t) = self.target.as_mut() {
            t.revealed = revealed;
        }
    }

    /// Pointer is over the faint target.
    pub fn hovering(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.cell == self.pointer)
    }

    /// Pointer-to-target distance in metres; infinite with no target.
    pub fn distance_to_target(&self) -> f32 {
        match &self.target {
            Some(t) => cell_distance_m(self.pointer, t.cell, self.cell_size_m),
            None => f32::INFINITY,
        }
    }

    /// What firing the pointer right now means to the controller.
    pub fn pointer_event(&self) -> Option<HostEvent> {
        let target = self.target.as_ref()?;
        if target.cell == self.pointer {
            Some(HostEvent::Found { animal_id: target.animal_id.to_string() })
        } else {
            Some(HostEvent::Miss { distance: self.distance_to_target() })
        }
    }
}

// ── Pointer ──

impl WorldState {
    /// Step the pointer, honouring the held-key cooldown.
    pub fn move_pointer(&mut self, dx: i32, dy: i32, move_rate: u32) {
        if self.move_cooldown > 0 {
            self.move_cooldown -= 1;
            return;
        }
        let x = (self.pointer.0 as i32 + dx).clamp(0, self.width as i32 - 1);
        let y = (self.pointer.1 as i32 + dy).clamp(0, self.height as i32 - 1);
        self.pointer = (x as usize, y as usize);
        self.move_cooldown = move_rate;
    }

    pub fn release_pointer(&mut self) {
        self.move_cooldown = 0;
    }
}

// ── HUD / timers ──

impl WorldState {
    pub fn show_indicator(&mut self, tier: Tier) {
        self.hud_tier = Some(tier);
        self.indicator = Some(Indicator { tier, timer: INDICATOR_TICKS });
    }

    /// Accumulate frame time; true when a proximity sample is due.
    pub fn sample_due(&mut self, dt: Duration, interval: Duration) -> bool {
        if interval.is_zero() { return true; }
        self.sample_elapsed += dt;
        if self.sample_elapsed >= interval {
            self.sample_elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Per-tick animation and message countdowns.
    pub fn tick(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
        if let Some(ind) = self.indicator.as_mut() {
            ind.timer = ind.timer.saturating_sub(1);
            if ind.timer == 0 { self.indicator = None; }
        }
    }

    /// Back to the animal grid. Cursor is kept.
    pub fn return_to_title(&mut self) {
        self.screen = Screen::Title;
        self.target = None;
        self.summary = None;
        self.indicator = None;
        self.hud_tier = None;
        self.anim_tick = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animal::Catalog;

    fn world() -> WorldState {
        WorldState::with_rng(&FeedbackConfig::default(), StdRng::seed_from_u64(7))
    }

    fn cow() -> Animal {
        *Catalog::builtin().find("cow").unwrap()
    }

    #[test]
    fn viewer_at_bottom_centre() {
        let w = world();
        assert_eq!(w.viewer, (FIELD_W / 2, FIELD_H - 1));
        assert_eq!(w.screen, Screen::Title);
        assert!(w.pointer_event().is_none());
    }

    #[test]
    fn placement_in_front_of_viewer() {
        let mut w = world();
        for _ in 0..50 {
            w.place_target(&cow());
            let t = w.target.as_ref().unwrap();
            assert!(t.cell.1 < w.viewer.1);
            assert!(!t.revealed);
            let d = cell_distance_m(w.viewer, t.cell, w.cell_size_m);
            // 4..8 m, with up to half a cell of rounding either way
            assert!(d >= 4.0 - 0.5 && d <= 8.0 + 0.5, "distance {d}");
        }
        assert_eq!(w.screen, Screen::Field);
    }

    #[test]
    fn same_seed_same_placement() {
        let mut a = world();
        let mut b = world();
        a.place_target(&cow());
        b.place_target(&cow());
        assert_eq!(a.target.unwrap().cell, b.target.unwrap().cell);
    }

    #[test]
    fn pointer_on_target_is_found() {
        let mut w = world();
        w.place_target(&cow());
        w.pointer = w.target.as_ref().unwrap().cell;
        assert!(w.hovering());
        assert_eq!(w.distance_to_target(), 0.0);
        assert_eq!(w.pointer_event(), Some(HostEvent::Found { animal_id: "cow".into() }));
    }

    #[test]
    fn pointer_off_target_is_miss_with_distance() {
        let mut w = world();
        w.place_target(&cow());
        let (tx, ty) = w.target.as_ref().unwrap().cell;
        w.pointer = (tx, ty + 4);
        match w.pointer_event() {
            Some(HostEvent::Miss { distance }) => assert!((distance - 2.0).abs() < 1e-6),
            other => panic!("expected miss, got {other:?}"),
        }
    }

    #[test]
    fn pointer_clamped_and_throttled() {
        let mut w = world();
        w.pointer = (0, 0);
        w.move_pointer(-1, -1, 2);
        assert_eq!(w.pointer, (0, 0));
        w.move_pointer(1, 0, 2);
        assert_eq!(w.pointer, (0, 0)); // cooling down
        w.release_pointer();
        w.move_pointer(1, 0, 2);
        assert_eq!(w.pointer, (1, 0));
    }

    #[test]
    fn indicator_expires() {
        let mut w = world();
        w.show_indicator(Tier::Warm);
        assert_eq!(w.hud_tier, Some(Tier::Warm));
        for _ in 0..INDICATOR_TICKS { w.tick(); }
        assert!(w.indicator.is_none());
        assert_eq!(w.hud_tier, Some(Tier::Warm));
    }

    #[test]
    fn samples_throttled() {
        let mut w = world();
        let every = Duration::from_millis(200);
        let frame = Duration::from_millis(50);
        let due: Vec<bool> = (0..8).map(|_| w.sample_due(frame, every)).collect();
        assert_eq!(due, vec![false, false, false, true, false, false, false, true]);
    }

    #[test]
    fn return_to_title_clears_round() {
        let mut w = world();
        w.place_target(&cow());
        w.select_cursor = 2;
        w.return_to_title();
        assert_eq!(w.screen, Screen::Title);
        assert!(w.target.is_none());
        assert_eq!(w.select_cursor, 2);
    }
}
