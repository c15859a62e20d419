/// Round controller: the find-the-animal state machine.
///
/// ## Phases
/// ┌─────────┬──────────────────────┬──────────┐
/// │ From     │ Event                 │ To       │
/// ├─────────┼──────────────────────┼──────────┤
/// │ any      │ start(unlocked id)    │ Playing  │
/// │ Playing  │ found(active id)      │ Won      │
/// │ Playing  │ pause                 │ Idle     │
/// │ Idle     │ resume (after pause)  │ Playing  │
/// │ Playing  │ miss / decay tick     │ Playing  │
/// └─────────┴──────────────────────┴──────────┘
/// Anything else is rejected with a `RoundError`; `handle()` logs and
/// drops it.
///
/// ## Timers
///   - Decay runs only while Playing and is stopped (elapsed discarded)
///     on every exit from Playing.
///   - The win summary is a `Deferred` tagged with the round id; a later
///     `start` cancels it, and a stale one that still fires is dropped.
///
/// All time comes from `advance(dt)`. No wall clock.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::{FeedbackConfig, ScoringConfig};
use crate::domain::animal::{Animal, Catalog};
use crate::domain::proximity::Feedback;
use crate::domain::rules;
use crate::domain::timer::{DecayTimer, Deferred};
use crate::error::RoundError;
use super::event::{GameEvent, HostEvent, WinSummary};
use super::ledger::UnlockLedger;

/// Sound handle for the hot/cold bell played on a miss.
pub const BELL_SOUND: &str = "bell-sound";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundPhase {
    Idle,
    Playing,
    Won,
}

pub struct RoundController {
    catalog: Catalog,
    ledger: UnlockLedger,
    scoring: ScoringConfig,
    feedback: FeedbackConfig,

    phase: RoundPhase,
    score: u32,
    active: Option<usize>,
    round_id: u64,
    found_latch: bool,
    /// Idle because of `pause`, not because nothing was ever started.
    paused: bool,

    decay: DecayTimer,
    summary: Option<Deferred<WinSummary>>,
}

impl RoundController {
    pub fn new(
        catalog: Catalog,
        ledger: UnlockLedger,
        scoring: ScoringConfig,
        feedback: FeedbackConfig,
    ) -> Self {
        let decay = DecayTimer::new(Duration::from_millis(scoring.decay_interval_ms));
        RoundController {
            catalog,
            ledger,
            score: scoring.start_score,
            scoring,
            feedback,
            phase: RoundPhase::Idle,
            active: None,
            round_id: 0,
            found_latch: false,
            paused: false,
            decay,
            summary: None,
        }
    }

    // ── Read-only accessors for the host ──

    pub fn phase(&self) -> RoundPhase { self.phase }
    pub fn score(&self) -> u32 { self.score }
    #[allow(dead_code)]
    pub fn round_id(&self) -> u64 { self.round_id }
    #[allow(dead_code)]
    pub fn is_paused(&self) -> bool { self.paused }
    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn ledger(&self) -> &UnlockLedger { &self.ledger }

    pub fn active_animal(&self) -> Option<&Animal> {
        self.active.and_then(|i| self.catalog.get(i))
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        self.ledger.is_unlocked(&self.catalog, index)
    }

    #[allow(dead_code)]
    pub fn decay_running(&self) -> bool {
        self.decay.is_running()
    }

    #[allow(dead_code)]
    pub fn summary_pending(&self) -> bool {
        self.summary.is_some()
    }

    // ══════════════════════════════════════════════════════════
    // Event entry point
    // ══════════════════════════════════════════════════════════

    /// Apply one host event. Rejected requests are logged and yield
    /// no events; the game never stops over a bad request.
    pub fn handle(&mut self, event: HostEvent) -> Vec<GameEvent> {
        let result = match event {
            HostEvent::Start { animal_id } => self.start(&animal_id),
            HostEvent::Found { animal_id } => self.report_found(&animal_id),
            HostEvent::Miss { distance } => self.report_miss(distance),
            HostEvent::Sample { distance } => Ok(self.sample_proximity(distance)),
            HostEvent::Pause => self.pause(),
            HostEvent::Resume => self.resume(),
            HostEvent::Advance(dt) => Ok(self.advance(dt)),
        };
        match result {
            Ok(events) => events,
            Err(e @ (RoundError::AlreadyFound | RoundError::NotPlaying { .. })) => {
                // Routine UI races (double clicks, late timers)
                debug!(error = %e, "host event ignored");
                vec![]
            }
            Err(e) => {
                warn!(error = %e, "host event rejected");
                vec![]
            }
        }
    }

    // ══════════════════════════════════════════════════════════
    // Transitions
    // ══════════════════════════════════════════════════════════

    /// Begin a round for `animal_id`, restarting any round in progress.
    pub fn start(&mut self, animal_id: &str) -> Result<Vec<GameEvent>, RoundError> {
        let index = self.catalog.index_of(animal_id)
            .ok_or_else(|| RoundError::UnknownAnimal(animal_id.to_string()))?;
        if !self.is_unlocked(index) {
            return Err(RoundError::Locked(animal_id.to_string()));
        }
        let id = self.catalog.get(index).map(|a| a.id).unwrap_or_default();

        if let Some(stale) = self.summary.take() {
            debug!(round_id = stale.round_id, "pending win summary cancelled by new round");
        }
        self.round_id += 1;
        self.active = Some(index);
        self.score = self.scoring.start_score;
        self.found_latch = false;
        self.paused = false;
        self.phase = RoundPhase::Playing;
        self.decay.start();

        info!(round_id = self.round_id, animal_id = id, "round started");
        Ok(vec![
            GameEvent::RoundStarted { round_id: self.round_id, animal_id: id },
            GameEvent::TargetPlaced { animal_id: id },
            GameEvent::TargetHidden,
        ])
    }

    /// Pointer fired and missed: penalty plus hot/cold feedback.
    pub fn report_miss(&mut self, distance: f32) -> Result<Vec<GameEvent>, RoundError> {
        self.require_playing("miss")?;
        self.score = rules::deduct(self.score, self.scoring.miss_penalty);

        let fb = Feedback::measure(distance, &self.feedback);
        debug!(distance, tier = ?fb.tier, score = self.score, "miss");
        Ok(vec![
            GameEvent::PenaltyApplied { score: self.score },
            GameEvent::SoundRequested { asset: BELL_SOUND, volume: fb.loudness() },
            GameEvent::HapticRequested {
                intensity: fb.haptic_intensity(),
                duration_ms: fb.haptic_duration_ms(),
            },
            GameEvent::FeedbackShown { tier: fb.tier },
        ])
    }

    /// The active animal was hit. At most once per round.
    pub fn report_found(&mut self, animal_id: &str) -> Result<Vec<GameEvent>, RoundError> {
        if self.found_latch {
            return Err(RoundError::AlreadyFound);
        }
        self.require_playing("found")?;
        let (index, animal) = match self.active.and_then(|i| self.catalog.get(i).map(|a| (i, *a))) {
            Some(pair) => pair,
            None => return Err(RoundError::UnknownAnimal(animal_id.to_string())),
        };
        if animal.id != animal_id {
            return Err(RoundError::WrongTarget { expected: animal.id, got: animal_id.to_string() });
        }

        self.found_latch = true;
        self.decay.stop();
        self.phase = RoundPhase::Won;

        let before = self.ledger.unlock_flags(&self.catalog);
        let found_count = self.ledger.record_found(animal.id);
        let after = self.ledger.unlock_flags(&self.catalog);
        let newly_unlocked: Vec<&'static str> = before.iter().zip(&after).enumerate()
            .filter(|(_, (was, now))| !**was && **now)
            .filter_map(|(i, _)| self.catalog.get(i).map(|a| a.id))
            .collect();

        let summary = WinSummary {
            round_id: self.round_id,
            animal_id: animal.id,
            animal_name: animal.name,
            score: self.score,
            found_count,
            newly_unlocked,
        };
        self.summary = Some(Deferred::new(
            self.round_id,
            Duration::from_millis(self.scoring.summary_delay_ms),
            summary,
        ));

        info!(
            round_id = self.round_id, animal_id = animal.id, index,
            score = self.score, found_count, "animal found",
        );
        Ok(vec![
            GameEvent::RoundWon { round_id: self.round_id, animal_id: animal.id, score: self.score },
            GameEvent::TargetRevealed,
            GameEvent::SoundRequested { asset: animal.sound, volume: 1.0 },
        ])
    }

    /// Host lost the play context. Score is kept; no find is recorded.
    pub fn pause(&mut self) -> Result<Vec<GameEvent>, RoundError> {
        self.require_playing("pause")?;
        self.decay.stop();
        self.phase = RoundPhase::Idle;
        self.paused = true;
        info!(round_id = self.round_id, score = self.score, "round paused");
        Ok(vec![GameEvent::RoundPaused { round_id: self.round_id }])
    }

    /// Continue a paused round with its score and target intact.
    pub fn resume(&mut self) -> Result<Vec<GameEvent>, RoundError> {
        if self.phase != RoundPhase::Idle || !self.paused || self.active.is_none() {
            return Err(RoundError::NothingToResume);
        }
        self.paused = false;
        self.phase = RoundPhase::Playing;
        self.decay.start();
        info!(round_id = self.round_id, score = self.score, "round resumed");
        Ok(vec![GameEvent::RoundResumed { round_id: self.round_id }])
    }

    // ══════════════════════════════════════════════════════════
    // Time and sampling
    // ══════════════════════════════════════════════════════════

    /// Advance host time: decay ticks, then the deferred win summary.
    pub fn advance(&mut self, dt: Duration) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.phase == RoundPhase::Playing {
            let ticks = self.decay.advance(dt);
            if ticks > 0 {
                self.score = rules::decay(self.score, ticks, self.scoring.decay_points);
                trace!(ticks, score = self.score, "score decayed");
                events.push(GameEvent::ScoreDecayed { score: self.score });
            }
        }

        let due = match self.summary.as_mut() {
            Some(task) => task.advance(dt),
            None => false,
        };
        if due {
            if let Some(task) = self.summary.take() {
                if task.round_id == self.round_id && self.phase == RoundPhase::Won {
                    events.push(GameEvent::SummaryReady(task.into_payload()));
                } else {
                    debug!(round_id = task.round_id, current = self.round_id, "stale win summary dropped");
                }
            }
        }

        events
    }

    /// Periodic hot/cold reading. Silent unless playing.
    pub fn sample_proximity(&self, distance: f32) -> Vec<GameEvent> {
        if self.phase != RoundPhase::Playing { return vec![]; }
        let fb = Feedback::measure(distance, &self.feedback);
        vec![GameEvent::ProximitySampled { tier: fb.tier }]
    }

    // ── Internal ──

    fn require_playing(&self, action: &'static str) -> Result<(), RoundError> {
        if self.phase == RoundPhase::Playing {
            Ok(())
        } else {
            Err(RoundError::NotPlaying { action, phase: self.phase })
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proximity::Tier;
    use crate::sim::ledger::MemoryStore;

    const SEC: Duration = Duration::from_secs(1);

    fn cow_pig() -> Catalog {
        Catalog::new(vec![Animal::new("cow", "Cow", 0), Animal::new("pig", "Pig", 5)])
    }

    fn controller_with(catalog: Catalog) -> RoundController {
        let ledger = UnlockLedger::in_memory(&catalog);
        RoundController::new(catalog, ledger, ScoringConfig::default(), FeedbackConfig::default())
    }

    fn controller() -> RoundController {
        controller_with(cow_pig())
    }

    fn summaries(events: &[GameEvent]) -> Vec<&WinSummary> {
        events.iter().filter_map(|e| match e {
            GameEvent::SummaryReady(s) => Some(s),
            _ => None,
        }).collect()
    }

    // ── Start ──

    #[test]
    fn starts_idle() {
        let c = controller();
        assert_eq!(c.phase(), RoundPhase::Idle);
        assert!(!c.decay_running());
        assert!(c.active_animal().is_none());
    }

    #[test]
    fn start_resets_score_and_places_target() {
        let mut c = controller();
        let events = c.start("cow").unwrap();
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert_eq!(c.score(), 1000);
        assert!(c.decay_running());
        assert_eq!(c.active_animal().map(|a| a.id), Some("cow"));
        assert!(events.contains(&GameEvent::TargetPlaced { animal_id: "cow" }));
        assert!(events.contains(&GameEvent::TargetHidden));
    }

    #[test]
    fn start_locked_animal_rejected() {
        let mut c = controller();
        assert_eq!(c.start("pig"), Err(RoundError::Locked("pig".into())));
        assert_eq!(c.phase(), RoundPhase::Idle);
        assert!(c.handle(HostEvent::Start { animal_id: "pig".into() }).is_empty());
    }

    #[test]
    fn start_unknown_animal_rejected() {
        let mut c = controller();
        assert_eq!(c.start("yeti"), Err(RoundError::UnknownAnimal("yeti".into())));
    }

    #[test]
    fn restart_mid_round_is_fresh() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(SEC * 3);
        c.advance(Duration::from_millis(900));
        c.report_miss(10.0).unwrap();
        let first_round = c.round_id();

        c.start("cow").unwrap();
        assert_eq!(c.score(), 1000);
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert!(c.round_id() > first_round);
        // Timer restarted from zero: the earlier 900ms must not count
        assert!(c.advance(Duration::from_millis(200)).is_empty());
        assert_eq!(c.score(), 1000);
        // Latch cleared: a find still counts
        c.report_found("cow").unwrap();
        assert_eq!(c.ledger().count_for("cow"), 1);
    }

    // ── Decay ──

    #[test]
    fn decay_two_points_per_second() {
        let mut c = controller();
        c.start("cow").unwrap();
        for i in 1..=10u32 {
            let events = c.advance(SEC);
            assert_eq!(c.score(), 1000 - 2 * i);
            assert_eq!(events, vec![GameEvent::ScoreDecayed { score: 1000 - 2 * i }]);
        }
    }

    #[test]
    fn decay_floors_at_zero() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(SEC * 499);
        assert_eq!(c.score(), 2);
        c.advance(SEC);
        assert_eq!(c.score(), 0);
        c.advance(SEC * 30);
        assert_eq!(c.score(), 0);
    }

    #[test]
    fn no_decay_outside_playing() {
        let mut c = controller();
        assert!(c.advance(SEC * 5).is_empty());
        assert_eq!(c.score(), 1000);

        c.start("cow").unwrap();
        c.report_found("cow").unwrap();
        c.advance(SEC * 5);
        assert_eq!(c.score(), 1000);
    }

    // ── Miss ──

    #[test]
    fn miss_deducts_ten_and_keeps_playing() {
        let mut c = controller();
        c.start("cow").unwrap();
        let events = c.report_miss(2.0).unwrap();
        assert_eq!(c.score(), 990);
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert!(events.contains(&GameEvent::FeedbackShown { tier: Tier::VeryHot }));
        assert!(events.iter().any(|e| matches!(e,
            GameEvent::SoundRequested { asset, .. } if *asset == BELL_SOUND)));
        assert!(events.iter().any(|e| matches!(e, GameEvent::HapticRequested { .. })));
    }

    #[test]
    fn miss_floors_at_zero() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(SEC * 496); // 8 points left
        c.report_miss(5.0).unwrap();
        assert_eq!(c.score(), 0);
    }

    #[test]
    fn miss_outside_playing_is_ignored() {
        let mut c = controller();
        assert!(matches!(c.report_miss(1.0), Err(RoundError::NotPlaying { .. })));
        assert!(c.handle(HostEvent::Miss { distance: 1.0 }).is_empty());
        assert_eq!(c.score(), 1000);
    }

    #[test]
    fn miss_volume_is_quadratic_in_proximity() {
        let mut c = controller();
        c.start("cow").unwrap();
        let events = c.report_miss(7.5).unwrap();
        let volume = events.iter().find_map(|e| match e {
            GameEvent::SoundRequested { volume, .. } => Some(*volume),
            _ => None,
        }).unwrap();
        assert!((volume - 0.25).abs() < 1e-6);
    }

    // ── Found ──

    #[test]
    fn scenario_start_decay_miss_found() {
        let mut c = controller();
        c.start("cow").unwrap();
        assert_eq!(c.score(), 1000);
        assert_eq!(c.phase(), RoundPhase::Playing);

        for _ in 0..3 { c.advance(SEC); }
        assert_eq!(c.score(), 994);

        c.report_miss(6.0).unwrap();
        assert_eq!(c.score(), 984);

        let events = c.report_found("cow").unwrap();
        assert_eq!(c.phase(), RoundPhase::Won);
        assert_eq!(c.score(), 984);
        assert_eq!(c.ledger().count_for("cow"), 1);
        assert!(!c.decay_running());
        assert!(events.contains(&GameEvent::TargetRevealed));
        assert!(events.iter().any(|e| matches!(e,
            GameEvent::SoundRequested { asset, .. } if *asset == "cow")));
    }

    #[test]
    fn found_twice_records_once() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.report_found("cow").unwrap();
        assert_eq!(c.report_found("cow"), Err(RoundError::AlreadyFound));
        assert!(c.handle(HostEvent::Found { animal_id: "cow".into() }).is_empty());
        assert_eq!(c.ledger().count_for("cow"), 1);
    }

    #[test]
    fn found_wrong_animal_rejected() {
        let mut c = controller();
        c.start("cow").unwrap();
        assert!(matches!(c.report_found("pig"), Err(RoundError::WrongTarget { .. })));
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert_eq!(c.ledger().count_for("pig"), 0);
    }

    #[test]
    fn found_while_idle_rejected() {
        let mut c = controller();
        assert!(matches!(c.report_found("cow"), Err(RoundError::NotPlaying { .. })));
        assert_eq!(c.ledger().count_for("cow"), 0);
    }

    #[test]
    fn found_no_longer_decays_after_win() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(Duration::from_millis(999));
        c.report_found("cow").unwrap();
        c.advance(SEC);
        assert_eq!(c.score(), 1000);
    }

    #[test]
    fn five_rounds_unlock_pig() {
        let mut c = controller();
        assert!(!c.is_unlocked(1));
        for round in 1..=5 {
            c.start("cow").unwrap();
            c.report_found("cow").unwrap();
            assert_eq!(c.ledger().count_for("cow"), round);
        }
        assert!(c.is_unlocked(1));
        assert!(c.start("pig").is_ok());
    }

    // ── Win summary ──

    #[test]
    fn summary_fires_after_delay() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(SEC * 2); // 996
        c.report_found("cow").unwrap();

        assert!(summaries(&c.advance(SEC)).is_empty());
        let events = c.advance(SEC);
        let s = summaries(&events);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].animal_id, "cow");
        assert_eq!(s[0].score, 996);
        assert_eq!(s[0].found_count, 1);
        assert!(s[0].newly_unlocked.is_empty());
        assert!(!c.summary_pending());

        // One-shot
        assert!(summaries(&c.advance(SEC * 5)).is_empty());
    }

    #[test]
    fn summary_lists_newly_unlocked() {
        let catalog = cow_pig();
        let store = MemoryStore::with_entries(&[("found_cow", "4")]);
        let ledger = UnlockLedger::load(Box::new(store), &catalog);
        let mut c = RoundController::new(catalog, ledger, ScoringConfig::default(), FeedbackConfig::default());

        c.start("cow").unwrap();
        c.report_found("cow").unwrap();
        let events = c.advance(SEC * 2);
        let s = summaries(&events);
        assert_eq!(s[0].newly_unlocked, vec!["pig"]);
        assert_eq!(s[0].found_count, 5);
    }

    #[test]
    fn new_round_cancels_pending_summary() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.report_found("cow").unwrap();
        c.advance(SEC);
        c.start("cow").unwrap();
        assert!(!c.summary_pending());
        assert!(summaries(&c.advance(SEC * 3)).is_empty());
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert_eq!(c.score(), 994);
    }

    // ── Pause / resume ──

    #[test]
    fn pause_stops_timer_and_keeps_score() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(SEC * 5);
        c.advance(Duration::from_millis(700));
        c.pause().unwrap();
        assert_eq!(c.phase(), RoundPhase::Idle);
        assert!(c.is_paused());
        assert!(!c.decay_running());
        assert_eq!(c.score(), 990);

        c.advance(SEC * 10);
        assert_eq!(c.score(), 990);
        assert_eq!(c.ledger().count_for("cow"), 0);
    }

    #[test]
    fn resume_continues_without_stale_ticks() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.advance(Duration::from_millis(900));
        c.pause().unwrap();
        c.resume().unwrap();
        assert_eq!(c.phase(), RoundPhase::Playing);
        assert!(c.advance(Duration::from_millis(500)).is_empty());
        assert_eq!(c.score(), 1000);
        c.advance(Duration::from_millis(500));
        assert_eq!(c.score(), 998);
        c.report_found("cow").unwrap();
        assert_eq!(c.ledger().count_for("cow"), 1);
    }

    #[test]
    fn start_after_pause_resets_score() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.report_miss(9.0).unwrap();
        c.pause().unwrap();
        c.start("cow").unwrap();
        assert_eq!(c.score(), 1000);
        assert!(!c.is_paused());
    }

    #[test]
    fn resume_without_pause_rejected() {
        let mut c = controller();
        assert_eq!(c.resume(), Err(RoundError::NothingToResume));
        c.start("cow").unwrap();
        assert_eq!(c.resume(), Err(RoundError::NothingToResume));
        c.report_found("cow").unwrap();
        assert_eq!(c.resume(), Err(RoundError::NothingToResume));
    }

    #[test]
    fn pause_outside_playing_rejected() {
        let mut c = controller();
        assert!(matches!(c.pause(), Err(RoundError::NotPlaying { .. })));
    }

    #[test]
    fn found_while_paused_rejected() {
        let mut c = controller();
        c.start("cow").unwrap();
        c.pause().unwrap();
        assert!(c.handle(HostEvent::Found { animal_id: "cow".into() }).is_empty());
        assert_eq!(c.ledger().count_for("cow"), 0);
    }

    // ── Sampling ──

    #[test]
    fn sample_only_while_playing() {
        let mut c = controller();
        assert!(c.sample_proximity(4.0).is_empty());
        c.start("cow").unwrap();
        assert_eq!(c.sample_proximity(4.0), vec![GameEvent::ProximitySampled { tier: Tier::Hot }]);
        assert_eq!(
            c.handle(HostEvent::Sample { distance: 10.0 }),
            vec![GameEvent::ProximitySampled { tier: Tier::Cold }],
        );
    }
}
