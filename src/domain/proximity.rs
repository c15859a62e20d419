/// Hot/cold proximity feedback.
///
/// Pure mapping from viewer-to-target distance (metres) to:
///   - a feedback tier (HUD colour, indicator text)
///   - a linear proximity in [0, 1]
///   - quadratic loudness / haptic intensity (sharper near the target)
///
/// ## Tiers (default thresholds)
/// ┌───────────────┬──────────┐
/// │ distance d     │ tier     │
/// ├───────────────┼──────────┤
/// │ d < 3          │ VeryHot  │
/// │ 3 <= d < 5     │ Hot      │
/// │ 5 <= d < 8     │ Warm     │
/// │ d >= 8         │ Cold     │
/// └───────────────┴──────────┘

use crate::config::FeedbackConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tier {
    VeryHot,
    Hot,
    Warm,
    Cold,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::VeryHot => "Very Hot!",
            Tier::Hot     => "Hot!",
            Tier::Warm    => "Warm",
            Tier::Cold    => "Cold",
        }
    }
}

/// NaN counts as "infinitely far", negatives as "right on top of it".
#[inline]
fn sanitize(distance: f32) -> f32 {
    if distance.is_nan() { f32::INFINITY } else { distance.max(0.0) }
}

pub fn tier_for(distance: f32, cfg: &FeedbackConfig) -> Tier {
    let d = sanitize(distance);
    if d < cfg.very_hot {
        Tier::VeryHot
    } else if d < cfg.hot {
        Tier::Hot
    } else if d < cfg.warm {
        Tier::Warm
    } else {
        Tier::Cold
    }
}

/// `clamp(1 - d / max_distance, 0, 1)`.
pub fn proximity(distance: f32, max_distance: f32) -> f32 {
    if max_distance <= 0.0 { return 0.0; }
    (1.0 - sanitize(distance) / max_distance).clamp(0.0, 1.0)
}

/// One feedback sample, computed from a single distance reading.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Feedback {
    pub tier: Tier,
    pub proximity: f32,
}

impl Feedback {
    pub fn measure(distance: f32, cfg: &FeedbackConfig) -> Self {
        Feedback {
            tier: tier_for(distance, cfg),
            proximity: proximity(distance, cfg.max_distance),
        }
    }

    /// Bell volume: quadratic falloff.
    pub fn loudness(&self) -> f32 {
        self.proximity * self.proximity
    }

    pub fn haptic_intensity(&self) -> f32 {
        self.proximity * self.proximity
    }

    /// 100 ms far away, up to 300 ms right on target.
    pub fn haptic_duration_ms(&self) -> u32 {
        (100.0 + self.proximity * 200.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FeedbackConfig {
        FeedbackConfig::default()
    }

    #[test]
    fn tier_examples() {
        let c = cfg();
        assert_eq!(tier_for(2.0, &c), Tier::VeryHot);
        assert_eq!(tier_for(4.0, &c), Tier::Hot);
        assert_eq!(tier_for(6.0, &c), Tier::Warm);
        assert_eq!(tier_for(10.0, &c), Tier::Cold);
    }

    #[test]
    fn tier_boundaries_are_half_open() {
        let c = cfg();
        assert_eq!(tier_for(0.0, &c), Tier::VeryHot);
        assert_eq!(tier_for(2.999, &c), Tier::VeryHot);
        assert_eq!(tier_for(3.0, &c), Tier::Hot);
        assert_eq!(tier_for(5.0, &c), Tier::Warm);
        assert_eq!(tier_for(8.0, &c), Tier::Cold);
    }

    #[test]
    fn degenerate_distances() {
        let c = cfg();
        assert_eq!(tier_for(-1.0, &c), Tier::VeryHot);
        assert_eq!(tier_for(f32::NAN, &c), Tier::Cold);
        assert_eq!(tier_for(f32::INFINITY, &c), Tier::Cold);
        assert_eq!(proximity(f32::NAN, 15.0), 0.0);
        assert_eq!(proximity(-3.0, 15.0), 1.0);
        assert_eq!(proximity(1.0, 0.0), 0.0);
    }

    #[test]
    fn proximity_is_linear_and_clamped() {
        assert!((proximity(0.0, 15.0) - 1.0).abs() < 1e-6);
        assert!((proximity(7.5, 15.0) - 0.5).abs() < 1e-6);
        assert_eq!(proximity(15.0, 15.0), 0.0);
        assert_eq!(proximity(40.0, 15.0), 0.0);
    }

    #[test]
    fn loudness_is_quadratic() {
        let f = Feedback::measure(7.5, &cfg());
        assert!((f.proximity - 0.5).abs() < 1e-6);
        assert!((f.loudness() - 0.25).abs() < 1e-6);
        assert!((f.haptic_intensity() - 0.25).abs() < 1e-6);
        assert_eq!(f.haptic_duration_ms(), 200);
    }

    #[test]
    fn far_miss_still_pulses_briefly() {
        let f = Feedback::measure(20.0, &cfg());
        assert_eq!(f.tier, Tier::Cold);
        assert_eq!(f.loudness(), 0.0);
        assert_eq!(f.haptic_duration_ms(), 100);
    }
}
