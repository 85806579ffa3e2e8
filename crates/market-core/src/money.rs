use rand::Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Decimal places kept on cash amounts and investor principal
pub const MONEY_DECIMALS: u32 = 2;

/// Round a cash amount to cents
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_DECIMALS)
}

/// Rounding and floor rules applied after every price update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRules {
    /// Lowest price any stock may reach
    pub floor: Decimal,
    /// Decimal places kept on prices
    pub decimals: u32,
    /// Highest price any stock may reach
    #[serde(default = "default_ceiling")]
    pub ceiling: Decimal,
}

fn default_ceiling() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

impl Default for PriceRules {
    fn default() -> Self {
        Self {
            floor: Decimal::ONE,
            decimals: 2,
            ceiling: default_ceiling(),
        }
    }
}

impl PriceRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.floor <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue(format!(
                "price floor must be positive, got {}",
                self.floor
            )));
        }
        if self.ceiling <= self.floor {
            return Err(ConfigError::InvalidValue(format!(
                "price ceiling {} must be above the floor {}",
                self.ceiling, self.floor
            )));
        }
        Ok(())
    }

    /// Apply a percentage move: `price * (1 + pct / 100)`, rounded, then clamped.
    ///
    /// A product too large for `Decimal` saturates at the ceiling.
    pub fn apply_percent(&self, price: Decimal, pct: f64) -> Decimal {
        let pct = Decimal::from_f64(pct).unwrap_or(Decimal::ZERO);
        let factor = Decimal::ONE + pct / Decimal::ONE_HUNDRED;
        let moved = price.checked_mul(factor).unwrap_or(self.ceiling);
        self.normalize(moved)
    }

    /// Round to the configured precision, then clamp between floor and ceiling.
    pub fn normalize(&self, price: Decimal) -> Decimal {
        price.round_dp(self.decimals).max(self.floor).min(self.ceiling)
    }
}

/// Uniform percentage-change range `[low, high]`, in percent.
///
/// Used both for per-turn regime volatility and for one-off shocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRange {
    pub low: f64,
    pub high: f64,
}

impl PercentRange {
    pub fn new(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(ConfigError::InvalidRange(format!(
                "percent range ({}, {}) is not finite",
                low, high
            )));
        }
        if low > high {
            return Err(ConfigError::InvalidRange(format!(
                "percent range has low {} > high {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    /// Draw one percentage uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low == self.high {
            return self.low;
        }
        rng.gen_range(self.low..=self.high)
    }

    pub fn contains(&self, pct: f64) -> bool {
        pct >= self.low && pct <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_percent_rounds_to_cents() {
        let rules = PriceRules::default();
        assert_eq!(rules.apply_percent(dec!(100), 20.0), dec!(120.00));
        assert_eq!(rules.apply_percent(dec!(33.33), 1.0), dec!(33.66));
        assert_eq!(rules.apply_percent(dec!(250), -10.0), dec!(225.00));
    }

    #[test]
    fn test_apply_percent_respects_floor() {
        let rules = PriceRules::default();
        assert_eq!(rules.apply_percent(dec!(1.20), -60.0), dec!(1));
        assert_eq!(rules.apply_percent(dec!(1), -2.25), dec!(1));
    }

    #[test]
    fn test_custom_floor() {
        let rules = PriceRules {
            floor: dec!(5),
            ..PriceRules::default()
        };
        assert_eq!(rules.apply_percent(dec!(6), -50.0), dec!(5));
        assert!(PriceRules {
            floor: dec!(0),
            ..PriceRules::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_apply_percent_saturates_at_ceiling() {
        let rules = PriceRules {
            ceiling: dec!(1000),
            ..PriceRules::default()
        };
        assert_eq!(rules.apply_percent(dec!(900), 20.0), dec!(1000));
        assert_eq!(rules.apply_percent(dec!(1000), -10.0), dec!(900));

        // a product past Decimal::MAX clamps instead of overflowing
        let rules = PriceRules::default();
        assert_eq!(rules.apply_percent(Decimal::MAX, 400.0), rules.ceiling);
        assert_eq!(rules.apply_percent(rules.ceiling, 400.0), rules.ceiling);

        let inverted = PriceRules {
            ceiling: dec!(1),
            ..PriceRules::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_percent_range_rejects_inverted_bounds() {
        assert!(PercentRange::new(-0.005, -1.25).is_err());
        assert!(PercentRange::new(-1.25, -0.005).is_ok());
        assert!(PercentRange::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_percent_range_sampling_stays_in_bounds() {
        let range = PercentRange::new(-0.55, -0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert!(range.contains(range.sample(&mut rng)));
        }

        let point = PercentRange::new(1.0, 1.0).unwrap();
        assert_eq!(point.sample(&mut rng), 1.0);
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec!(1043.2871)), dec!(1043.29));
    }
}
