/// Terminal implementation of `Host`.
///
/// Borrows the scene state and the output devices for the span of one
/// `dispatch` call. Sound and rumble are optional; when either is
/// missing the request is dropped.

use tracing::{debug, info};

use crate::domain::animal::Catalog;
use crate::domain::proximity::Tier;
use crate::sim::event::WinSummary;
use crate::sim::host::Host;
use crate::sim::world::{Screen, WorldState};
use super::gamepad::GamepadState;
use super::sound::SoundEngine;

pub struct TerminalHost<'a> {
    pub world: &'a mut WorldState,
    pub catalog: &'a Catalog,
    pub sound: Option<&'a SoundEngine>,
    pub pad: &'a mut GamepadState,
}

impl Host for TerminalHost<'_> {
    fn place_target(&mut self, animal_id: &'static str) {
        match self.catalog.find(animal_id) {
            Some(animal) => {
                self.world.place_target(animal);
                debug!(animal_id, image = animal.image, cell = ?self.world.target.as_ref().map(|t| t.cell), "target placed");
            }
            None => debug!(animal_id, "place_target for unknown animal"),
        }
    }

    fn hide_target(&mut self) {
        self.world.set_revealed(false);
    }

    fn reveal_target(&mut self) {
        self.world.set_revealed(true);
    }

    fn play_sound(&mut self, asset: &'static str, volume: f32) {
        if let Some(sfx) = self.sound {
            sfx.play(asset, volume);
        }
    }

    fn trigger_haptic(&mut self, intensity: f32, duration_ms: u32) {
        if self.pad.connected {
            self.pad.rumble(intensity, duration_ms);
        }
    }

    fn distance_to_target(&self) -> f32 {
        self.world.distance_to_target()
    }

    fn show_feedback(&mut self, tier: Tier) {
        self.world.show_indicator(tier);
    }

    fn show_proximity(&mut self, tier: Tier) {
        self.world.hud_tier = Some(tier);
    }

    /// Only takes over the field; a player who already left for the
    /// animal grid is not yanked back.
    fn show_summary(&mut self, summary: &WinSummary) {
        if self.world.screen != Screen::Field {
            debug!(screen = ?self.world.screen, "win summary skipped");
            return;
        }
        info!(animal_id = summary.animal_id, score = summary.score, "win summary shown");
        self.world.summary = Some(summary.clone());
        self.world.screen = Screen::Summary;
    }
}
