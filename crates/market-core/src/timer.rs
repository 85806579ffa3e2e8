use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Inclusive range of turns a countdown is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRange {
    pub min: u32,
    pub max: u32,
}

impl TimerRange {
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 {
            return Err(ConfigError::InvalidRange(
                "timer range must start at 1 turn or more".to_string(),
            ));
        }
        if self.min > self.max {
            return Err(ConfigError::InvalidRange(format!(
                "timer range {}..={} has min > max",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        i64::from(rng.gen_range(self.min..=self.max))
    }
}

/// Turn countdown shared by every periodic subsystem.
///
/// Decremented once per turn; it has expired once it reaches zero or below.
/// A countdown that expires while its owner cannot act (e.g. a full investor
/// pool) stays expired until it is explicitly reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: i64,
}

impl Countdown {
    pub fn new(remaining: i64) -> Self {
        Self { remaining }
    }

    pub fn start<R: Rng + ?Sized>(range: &TimerRange, rng: &mut R) -> Self {
        Self::new(range.sample(rng))
    }

    /// Decrement by one turn and report whether the countdown has expired.
    pub fn tick(&mut self) -> bool {
        self.remaining -= 1;
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, range: &TimerRange, rng: &mut R) {
        self.remaining = range.sample(rng);
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_timer_range_validation() {
        assert!(TimerRange::new(30, 40).is_ok());
        assert!(TimerRange::new(5, 5).is_ok());
        assert!(TimerRange::new(0, 5).is_err());
        assert!(TimerRange::new(10, 5).is_err());
    }

    #[test]
    fn test_countdown_expires_after_remaining_ticks() {
        let mut countdown = Countdown::new(3);
        assert!(!countdown.tick());
        assert!(!countdown.tick());
        assert!(countdown.tick());
        // keeps counting down while nobody resets it
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), -1);
    }

    #[test]
    fn test_reset_draws_within_range() {
        let range = TimerRange::new(200, 300).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut countdown = Countdown::new(0);
        for _ in 0..200 {
            countdown.reset(&range, &mut rng);
            assert!((200..=300).contains(&countdown.remaining()));
        }
    }
}
