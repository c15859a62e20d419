/// Unlock and scoring rules.
///
/// Pure functions, no side effects. These encode "what is allowed"
/// and "what the score becomes"; the round controller applies them.
///
/// ## Unlock Truth Table
/// ┌──────────────────────────────────────┬──────────┐
/// │ Condition (priority order)            │ Unlocked │
/// ├──────────────────────────────────────┼──────────┤
/// │ index out of range                    │ NO       │
/// │ index == 0                            │ YES      │
/// │ found(prev) >= requirement(index)     │ YES      │
/// │ otherwise                             │ NO       │
/// └──────────────────────────────────────┴──────────┘
///
/// ## Score
/// Score never drops below 0 and has no ceiling. Every deduction
/// (decay tick, miss penalty) saturates at 0.

use super::animal::Animal;

/// Is `catalog[index]` selectable given the found counts?
///
/// `found` maps an animal id to its stored found count.
pub fn is_unlocked<F>(catalog: &[Animal], index: usize, found: F) -> bool
where
    F: Fn(&str) -> u32,
{
    if index >= catalog.len() { return false; }
    if index == 0 { return true; }
    found(catalog[index - 1].id) >= catalog[index].unlock_requirement
}

/// Unlock flag for every catalog entry, in order.
pub fn unlock_flags<F>(catalog: &[Animal], found: F) -> Vec<bool>
where
    F: Fn(&str) -> u32,
{
    (0..catalog.len()).map(|i| is_unlocked(catalog, i, &found)).collect()
}

/// How many more finds of the previous animal `catalog[index]` needs.
/// `None` for the first entry or an out-of-range index.
pub fn finds_remaining<F>(catalog: &[Animal], index: usize, found: F) -> Option<u32>
where
    F: Fn(&str) -> u32,
{
    if index == 0 || index >= catalog.len() { return None; }
    let have = found(catalog[index - 1].id);
    Some(catalog[index].unlock_requirement.saturating_sub(have))
}

/// Subtract `amount` from `score`, floored at 0.
#[inline]
pub fn deduct(score: u32, amount: u32) -> u32 {
    score.saturating_sub(amount)
}

/// Apply `ticks` decay steps of `per_tick` points each.
#[inline]
pub fn decay(score: u32, ticks: u32, per_tick: u32) -> u32 {
    deduct(score, ticks.saturating_mul(per_tick))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn farm() -> Vec<Animal> {
        vec![
            Animal::new("cow", "Cow", 0),
            Animal::new("pig", "Pig", 5),
            Animal::new("hen", "Hen", 2),
        ]
    }

    fn counts(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn lookup(m: &HashMap<String, u32>) -> impl Fn(&str) -> u32 + '_ {
        move |id: &str| m.get(id).copied().unwrap_or(0)
    }

    // ── Unlock rules ──

    #[test]
    fn first_entry_always_unlocked() {
        let c = farm();
        assert!(is_unlocked(&c, 0, |_| 0));
        // Requirement on the first entry is ignored even if set
        let odd = vec![Animal::new("cow", "Cow", 99)];
        assert!(is_unlocked(&odd, 0, |_| 0));
    }

    #[test]
    fn unlock_flips_exactly_at_threshold() {
        let c = farm();
        let below = counts(&[("cow", 4)]);
        let at = counts(&[("cow", 5)]);
        let above = counts(&[("cow", 9)]);
        assert!(!is_unlocked(&c, 1, lookup(&below)));
        assert!(is_unlocked(&c, 1, lookup(&at)));
        assert!(is_unlocked(&c, 1, lookup(&above)));
    }

    #[test]
    fn unlock_depends_only_on_previous_entry() {
        let c = farm();
        // Plenty of cow finds do not unlock the hen; only pig finds do
        let m = counts(&[("cow", 50), ("pig", 1)]);
        assert!(!is_unlocked(&c, 2, lookup(&m)));
        let m = counts(&[("cow", 0), ("pig", 2)]);
        assert!(is_unlocked(&c, 2, lookup(&m)));
    }

    #[test]
    fn out_of_range_is_locked() {
        let c = farm();
        assert!(!is_unlocked(&c, 3, |_| 1000));
        assert!(!is_unlocked(&[], 0, |_| 0));
    }

    #[test]
    fn flags_follow_frontier() {
        let c = farm();
        let m = counts(&[("cow", 5)]);
        assert_eq!(unlock_flags(&c, lookup(&m)), vec![true, true, false]);
    }

    #[test]
    fn remaining_finds() {
        let c = farm();
        let m = counts(&[("cow", 3)]);
        assert_eq!(finds_remaining(&c, 0, lookup(&m)), None);
        assert_eq!(finds_remaining(&c, 1, lookup(&m)), Some(2));
        assert_eq!(finds_remaining(&c, 2, lookup(&m)), Some(2));
        let m = counts(&[("cow", 8)]);
        assert_eq!(finds_remaining(&c, 1, lookup(&m)), Some(0));
    }

    // ── Score rules ──

    #[test]
    fn deduct_floors_at_zero() {
        assert_eq!(deduct(1000, 10), 990);
        assert_eq!(deduct(7, 10), 0);
        assert_eq!(deduct(0, 2), 0);
    }

    #[test]
    fn decay_is_linear_per_tick() {
        assert_eq!(decay(1000, 3, 2), 994);
        assert_eq!(decay(1000, 0, 2), 1000);
        assert_eq!(decay(5, 3, 2), 0);
        assert_eq!(decay(10, u32::MAX, 2), 0);
    }
}
