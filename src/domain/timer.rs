/// Round timers driven by host-supplied elapsed time.
///
/// Nothing here reads a clock. The host calls `advance(dt)` once per
/// frame, which makes every timer deterministic under test.
///
///   - `DecayTimer`   — periodic, fires whole ticks, fully stoppable.
///   - `Deferred<T>`  — one-shot, carries a payload and the round id that
///                      scheduled it so a stale completion can be dropped.

use std::time::Duration;

/// Periodic timer. Leftover time below one period carries over between
/// `advance` calls; `stop` discards it.
#[derive(Clone, Debug)]
pub struct DecayTimer {
    period: Duration,
    elapsed: Duration,
    running: bool,
}

impl DecayTimer {
    pub fn new(period: Duration) -> Self {
        DecayTimer { period, elapsed: Duration::ZERO, running: false }
    }

    /// Start from zero elapsed (also restarts a running timer).
    pub fn start(&mut self) {
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.elapsed = Duration::ZERO;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[allow(dead_code)]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advance by `dt` and return how many full periods completed.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running || self.period.is_zero() { return 0; }
        self.elapsed += dt;
        let period = self.period.as_nanos();
        let ticks = self.elapsed.as_nanos() / period;
        if ticks == 0 { return 0; }
        let consumed = ticks * period;
        self.elapsed = Duration::from_nanos((self.elapsed.as_nanos() - consumed) as u64);
        ticks.min(u32::MAX as u128) as u32
    }
}

/// One-shot deferred task tagged with the round that scheduled it.
#[derive(Clone, Debug)]
pub struct Deferred<T> {
    pub round_id: u64,
    remaining: Duration,
    payload: T,
}

impl<T> Deferred<T> {
    pub fn new(round_id: u64, delay: Duration, payload: T) -> Self {
        Deferred { round_id, remaining: delay, payload }
    }

    /// Count down; true once the delay has fully elapsed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn stopped_timer_never_ticks() {
        let mut t = DecayTimer::new(SEC);
        assert_eq!(t.advance(SEC * 10), 0);
        assert!(!t.is_running());
    }

    #[test]
    fn ticks_on_whole_periods_and_carries_remainder() {
        let mut t = DecayTimer::new(SEC);
        t.start();
        assert_eq!(t.advance(Duration::from_millis(600)), 0);
        assert_eq!(t.advance(Duration::from_millis(600)), 1); // 1.2s
        assert_eq!(t.elapsed(), Duration::from_millis(200));
        assert_eq!(t.advance(Duration::from_millis(2800)), 3); // 4.0s total
        assert_eq!(t.elapsed(), Duration::ZERO);
    }

    #[test]
    fn stop_discards_pending_time() {
        let mut t = DecayTimer::new(SEC);
        t.start();
        t.advance(Duration::from_millis(900));
        t.stop();
        t.start();
        // Fresh start: the old 900ms must not leak in
        assert_eq!(t.advance(Duration::from_millis(200)), 0);
        assert_eq!(t.advance(Duration::from_millis(800)), 1);
    }

    #[test]
    fn restart_while_running_resets_elapsed() {
        let mut t = DecayTimer::new(SEC);
        t.start();
        t.advance(Duration::from_millis(999));
        t.start();
        assert_eq!(t.advance(Duration::from_millis(1)), 0);
    }

    #[test]
    fn deferred_fires_once_delay_elapsed() {
        let mut d = Deferred::new(7, SEC * 2, "summary");
        assert!(!d.advance(SEC));
        assert!(d.advance(SEC));
        assert_eq!(d.round_id, 7);
        assert_eq!(d.into_payload(), "summary");
    }

    #[test]
    fn deferred_overshoot_still_fires() {
        let mut d = Deferred::new(1, SEC, ());
        assert!(d.advance(SEC * 5));
    }
}
