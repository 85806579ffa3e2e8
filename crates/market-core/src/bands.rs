//! Percentage band tables.
//!
//! A band table maps a uniform integer roll in `[1, 100]` onto a value through
//! contiguous half-open intervals `[start, end)`. Tables must cover
//! `[1, 101)` exactly, so every roll resolves to one band and no two bands can
//! claim the same roll.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest roll a band table accepts
pub const ROLL_MIN: u32 = 1;

/// Largest roll a band table accepts
pub const ROLL_MAX: u32 = 100;

/// One half-open interval `[start, end)` of a band table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band<T> {
    pub start: u32,
    pub end: u32,
    pub value: T,
}

impl<T> Band<T> {
    pub fn new(start: u32, end: u32, value: T) -> Self {
        Self { start, end, value }
    }

    /// Number of rolls (out of 100) landing in this band
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    pub fn contains(&self, roll: u32) -> bool {
        roll >= self.start && roll < self.end
    }
}

/// Validated, gap-free, non-overlapping band table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandTable<T> {
    bands: Vec<Band<T>>,
}

impl<T: Copy> BandTable<T> {
    /// Build a table from bands listed in ascending order.
    pub fn new(bands: Vec<Band<T>>) -> Result<Self, ConfigError> {
        let Some(first) = bands.first() else {
            return Err(ConfigError::InvalidBands("table has no bands".to_string()));
        };
        if first.start != ROLL_MIN {
            return Err(ConfigError::InvalidBands(format!(
                "first band starts at {} (expected {})",
                first.start, ROLL_MIN
            )));
        }

        let mut expected_start = ROLL_MIN;
        for band in &bands {
            if band.start != expected_start {
                return Err(ConfigError::InvalidBands(format!(
                    "band [{}, {}) does not start at {} (gap or overlap)",
                    band.start, band.end, expected_start
                )));
            }
            if band.end <= band.start {
                return Err(ConfigError::InvalidBands(format!(
                    "band [{}, {}) is empty",
                    band.start, band.end
                )));
            }
            expected_start = band.end;
        }

        if expected_start != ROLL_MAX + 1 {
            return Err(ConfigError::InvalidBands(format!(
                "bands end at {} (expected {})",
                expected_start,
                ROLL_MAX + 1
            )));
        }

        Ok(Self { bands })
    }

    /// Resolve a roll to its band value. Rolls outside `[1, 100]` are clamped.
    pub fn lookup(&self, roll: u32) -> T {
        let roll = roll.clamp(ROLL_MIN, ROLL_MAX);
        self.bands
            .iter()
            .find(|band| band.contains(roll))
            .unwrap_or(&self.bands[self.bands.len() - 1])
            .value
    }

    /// Draw one roll in `[1, 100]` and resolve it.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, T) {
        let roll = rng.gen_range(ROLL_MIN..=ROLL_MAX);
        (roll, self.lookup(roll))
    }

    pub fn bands(&self) -> &[Band<T>] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn three_way() -> BandTable<char> {
        BandTable::new(vec![
            Band::new(1, 11, 'a'),
            Band::new(11, 51, 'b'),
            Band::new(51, 101, 'c'),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_edges_are_half_open() {
        let table = three_way();
        assert_eq!(table.lookup(1), 'a');
        assert_eq!(table.lookup(10), 'a');
        assert_eq!(table.lookup(11), 'b');
        assert_eq!(table.lookup(50), 'b');
        assert_eq!(table.lookup(51), 'c');
        assert_eq!(table.lookup(100), 'c');
    }

    #[test]
    fn test_out_of_range_rolls_are_clamped() {
        let table = three_way();
        assert_eq!(table.lookup(0), 'a');
        assert_eq!(table.lookup(250), 'c');
    }

    #[test]
    fn test_rejects_overlap() {
        let result = BandTable::new(vec![Band::new(1, 40, 'a'), Band::new(35, 101, 'b')]);
        assert!(matches!(result, Err(ConfigError::InvalidBands(_))));
    }

    #[test]
    fn test_rejects_gap_and_short_coverage() {
        let gap = BandTable::new(vec![Band::new(1, 40, 'a'), Band::new(45, 101, 'b')]);
        assert!(gap.is_err());

        let short = BandTable::new(vec![Band::new(1, 40, 'a'), Band::new(40, 100, 'b')]);
        assert!(short.is_err());

        let empty: Result<BandTable<char>, _> = BandTable::new(vec![]);
        assert!(empty.is_err());
    }

    #[test]
    fn test_rejects_empty_band() {
        let result = BandTable::new(vec![
            Band::new(1, 50, 'a'),
            Band::new(50, 50, 'b'),
            Band::new(50, 101, 'c'),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rolls_stay_in_range() {
        let table = three_way();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let (roll, value) = table.roll(&mut rng);
            assert!((ROLL_MIN..=ROLL_MAX).contains(&roll));
            assert_eq!(value, table.lookup(roll));
        }
    }

    #[test]
    fn test_widths_sum_to_one_hundred() {
        let total: u32 = three_way().bands().iter().map(|b| b.width()).sum();
        assert_eq!(total, 100);
    }
}
