/// Target placement on the play field.
///
/// The animal is hidden in front of the viewer: 4–8 m away, within
/// ±45° of straight ahead. Field coordinates are cells; `cell_size_m`
/// converts between cells and metres. The viewer stands on the bottom
/// row and "ahead" is toward row 0.

use std::f32::consts::FRAC_PI_4;

use rand::Rng;

pub const MIN_DISTANCE_M: f32 = 4.0;
pub const MAX_DISTANCE_M: f32 = 8.0;

/// Polar placement relative to the viewer.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Placement {
    pub distance_m: f32,
    /// Radians, 0 = straight ahead, negative = left.
    pub angle: f32,
}

impl Placement {
    pub fn random(rng: &mut impl Rng) -> Self {
        Placement {
            distance_m: rng.random_range(MIN_DISTANCE_M..MAX_DISTANCE_M),
            angle: rng.random_range(-FRAC_PI_4..FRAC_PI_4),
        }
    }

    /// Convert to a field cell, clamped inside `w` x `h`.
    pub fn to_cell(&self, viewer: (usize, usize), cell_size_m: f32, w: usize, h: usize) -> (usize, usize) {
        if w == 0 || h == 0 { return (0, 0); }
        let cells = self.distance_m / cell_size_m.max(f32::EPSILON);
        let x = viewer.0 as f32 + self.angle.sin() * cells;
        let y = viewer.1 as f32 - self.angle.cos() * cells;
        let x = x.round().clamp(0.0, (w - 1) as f32) as usize;
        let y = y.round().clamp(0.0, (h - 1) as f32) as usize;
        // Never hide the animal under the viewer
        if (x, y) == viewer {
            return (x, y.saturating_sub(1));
        }
        (x, y)
    }
}

/// Euclidean distance between two cells, in metres.
pub fn cell_distance_m(a: (usize, usize), b: (usize, usize), cell_size_m: f32) -> f32 {
    let dx = a.0 as f32 - b.0 as f32;
    let dy = a.1 as f32 - b.1 as f32;
    (dx * dx + dy * dy).sqrt() * cell_size_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_placement_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let p = Placement::random(&mut rng);
            assert!(p.distance_m >= MIN_DISTANCE_M && p.distance_m < MAX_DISTANCE_M);
            assert!(p.angle >= -FRAC_PI_4 && p.angle < FRAC_PI_4);
        }
    }

    #[test]
    fn straight_ahead_is_up_the_column() {
        let p = Placement { distance_m: 5.0, angle: 0.0 };
        // 5m at 0.5m per cell = 10 cells up from (15, 19)
        assert_eq!(p.to_cell((15, 19), 0.5, 30, 20), (15, 9));
    }

    #[test]
    fn angle_moves_sideways() {
        let left = Placement { distance_m: 6.0, angle: -FRAC_PI_4 };
        let right = Placement { distance_m: 6.0, angle: FRAC_PI_4 };
        let (lx, _) = left.to_cell((15, 19), 0.5, 30, 20);
        let (rx, _) = right.to_cell((15, 19), 0.5, 30, 20);
        assert!(lx < 15);
        assert!(rx > 15);
    }

    #[test]
    fn placement_clamped_into_small_field() {
        let p = Placement { distance_m: 8.0, angle: 0.0 };
        let (x, y) = p.to_cell((2, 4), 0.5, 5, 5);
        assert!(x < 5 && y < 5);
        assert_eq!(y, 0);
    }

    #[test]
    fn never_under_viewer() {
        let p = Placement { distance_m: 0.1, angle: 0.0 };
        assert_ne!(p.to_cell((3, 3), 0.5, 8, 8), (3, 3));
    }

    #[test]
    fn distance_in_metres() {
        assert!((cell_distance_m((0, 0), (3, 4), 0.5) - 2.5).abs() < 1e-6);
        assert_eq!(cell_distance_m((7, 7), (7, 7), 0.5), 0.0);
    }
}
