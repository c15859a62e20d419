/// Events crossing the core/host boundary.
///
/// `HostEvent`  — what the host reports to the round controller.
/// `GameEvent`  — what the controller asks the host to do (or tells it
///                happened). The host consumes these for display, sound
///                and haptics; see `host::dispatch`.

use std::time::Duration;

use crate::domain::proximity::Tier;

#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    Start { animal_id: String },
    Found { animal_id: String },
    /// Pointer fired but hit nothing; `distance` is viewer-to-target.
    Miss { distance: f32 },
    /// Periodic hot/cold reading while playing.
    Sample { distance: f32 },
    Pause,
    Resume,
    Advance(Duration),
}

/// Win-screen content, captured when the animal is found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinSummary {
    pub round_id: u64,
    pub animal_id: &'static str,
    pub animal_name: &'static str,
    pub score: u32,
    pub found_count: u32,
    /// Animals that became selectable because of this find.
    pub newly_unlocked: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    // ── Target ──
    TargetPlaced { animal_id: &'static str },
    TargetHidden,
    TargetRevealed,

    // ── Feedback ──
    SoundRequested { asset: &'static str, volume: f32 },
    HapticRequested { intensity: f32, duration_ms: u32 },
    /// Indicator after a miss.
    FeedbackShown { tier: Tier },
    /// HUD colour from a periodic sample.
    ProximitySampled { tier: Tier },

    // ── Score ──
    ScoreDecayed { score: u32 },
    PenaltyApplied { score: u32 },

    // ── Lifecycle ──
    RoundStarted { round_id: u64, animal_id: &'static str },
    RoundWon { round_id: u64, animal_id: &'static str, score: u32 },
    RoundPaused { round_id: u64 },
    RoundResumed { round_id: u64 },
    SummaryReady(WinSummary),
}
