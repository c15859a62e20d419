/// The host side of the core/host boundary.
///
/// The round controller never calls into the host directly. It returns
/// `GameEvent`s and `dispatch` turns them into `Host` calls. Side effects
/// here are fire-and-forget: a host that cannot play a sound or rumble a
/// pad logs it and returns.

use tracing::trace;

use crate::domain::proximity::Tier;
use super::event::{GameEvent, WinSummary};

pub trait Host {
    /// Put the (still hidden) target for `animal_id` into the scene.
    fn place_target(&mut self, animal_id: &'static str);
    fn hide_target(&mut self);
    fn reveal_target(&mut self);

    fn play_sound(&mut self, asset: &'static str, volume: f32);
    fn trigger_haptic(&mut self, intensity: f32, duration_ms: u32);

    /// Viewer-to-target distance in metres, sampled for miss and
    /// proximity reports.
    fn distance_to_target(&self) -> f32;

    /// Tier indicator after a miss.
    fn show_feedback(&mut self, tier: Tier);

    /// HUD colour from a periodic sample. Defaults to the miss indicator.
    fn show_proximity(&mut self, tier: Tier) {
        self.show_feedback(tier);
    }

    fn show_summary(&mut self, summary: &WinSummary);
}

/// Apply controller output to the host, in order.
pub fn dispatch(host: &mut dyn Host, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::TargetPlaced { animal_id } => host.place_target(animal_id),
            GameEvent::TargetHidden => host.hide_target(),
            GameEvent::TargetRevealed => host.reveal_target(),

            GameEvent::SoundRequested { asset, volume } => host.play_sound(asset, *volume),
            GameEvent::HapticRequested { intensity, duration_ms } => {
                host.trigger_haptic(*intensity, *duration_ms)
            }
            GameEvent::FeedbackShown { tier } => host.show_feedback(*tier),
            GameEvent::ProximitySampled { tier } => host.show_proximity(*tier),

            GameEvent::SummaryReady(summary) => host.show_summary(summary),

            // Score lives on the controller; the host reads it when drawing
            GameEvent::ScoreDecayed { .. }
            | GameEvent::PenaltyApplied { .. }
            | GameEvent::RoundStarted { .. }
            | GameEvent::RoundWon { .. }
            | GameEvent::RoundPaused { .. }
            | GameEvent::RoundResumed { .. } => trace!(?event, "no host action"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Host that writes every call down.
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub calls: Vec<String>,
        pub distance: f32,
        pub summary: Option<WinSummary>,
    }

    impl Host for RecordingHost {
        fn place_target(&mut self, animal_id: &'static str) {
            self.calls.push(format!("place {animal_id}"));
        }
        fn hide_target(&mut self) { self.calls.push("hide".into()); }
        fn reveal_target(&mut self) { self.calls.push("reveal".into()); }
        fn play_sound(&mut self, asset: &'static str, volume: f32) {
            self.calls.push(format!("sound {asset} {volume:.2}"));
        }
        fn trigger_haptic(&mut self, intensity: f32, duration_ms: u32) {
            self.calls.push(format!("haptic {intensity:.2} {duration_ms}"));
        }
        fn distance_to_target(&self) -> f32 { self.distance }
        fn show_feedback(&mut self, tier: Tier) {
            self.calls.push(format!("feedback {}", tier.label()));
        }
        fn show_summary(&mut self, summary: &WinSummary) {
            self.calls.push(format!("summary {}", summary.animal_id));
            self.summary = Some(summary.clone());
        }
    }

    #[test]
    fn dispatch_preserves_order() {
        let mut host = RecordingHost::default();
        dispatch(&mut host, &[
            GameEvent::RoundStarted { round_id: 1, animal_id: "cow" },
            GameEvent::TargetPlaced { animal_id: "cow" },
            GameEvent::TargetHidden,
        ]);
        assert_eq!(host.calls, vec!["place cow", "hide"]);
    }

    #[test]
    fn proximity_falls_back_to_feedback() {
        let mut host = RecordingHost::default();
        dispatch(&mut host, &[GameEvent::ProximitySampled { tier: Tier::Warm }]);
        assert_eq!(host.calls, vec![format!("feedback {}", Tier::Warm.label())]);
    }

    #[test]
    fn summary_reaches_host() {
        let mut host = RecordingHost::default();
        let summary = WinSummary {
            round_id: 3,
            animal_id: "pig",
            animal_name: "Pig",
            score: 900,
            found_count: 2,
            newly_unlocked: vec![],
        };
        dispatch(&mut host, &[GameEvent::SummaryReady(summary.clone())]);
        assert_eq!(host.summary, Some(summary));
    }

    #[test]
    fn controller_round_through_host() {
        use crate::config::{FeedbackConfig, ScoringConfig};
        use crate::domain::animal::Catalog;
        use crate::sim::event::HostEvent;
        use crate::sim::ledger::UnlockLedger;
        use crate::sim::round::RoundController;
        use std::time::Duration;

        let catalog = Catalog::builtin();
        let ledger = UnlockLedger::in_memory(&catalog);
        let mut ctl = RoundController::new(catalog, ledger, ScoringConfig::default(), FeedbackConfig::default());
        let mut host = RecordingHost { distance: 0.0, ..Default::default() };

        let events = ctl.handle(HostEvent::Start { animal_id: "cow".into() });
        dispatch(&mut host, &events);
        let events = ctl.handle(HostEvent::Miss { distance: host.distance_to_target() });
        dispatch(&mut host, &events);
        let events = ctl.handle(HostEvent::Found { animal_id: "cow".into() });
        dispatch(&mut host, &events);
        let events = ctl.handle(HostEvent::Advance(Duration::from_secs(2)));
        dispatch(&mut host, &events);

        assert_eq!(host.calls, vec![
            "place cow",
            "hide",
            "sound bell-sound 1.00",
            "haptic 1.00 300",
            "feedback Very Hot!",
            "reveal",
            "sound cow-sound 1.00",
            "summary cow",
        ]);
        assert_eq!(host.summary.map(|s| s.score), Some(990));
    }
}
