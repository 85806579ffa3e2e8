use market_core::{ConfigError, PercentRange, PriceRules, Stock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::price_process::PriceMove;

/// Periodic single-stock earnings surprise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsConfig {
    /// Report every `interval` turns; `None` disables reports
    pub interval: Option<u32>,
    /// Percentage move applied to the reporting stock
    pub surprise: PercentRange,
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self {
            interval: None,
            surprise: PercentRange {
                low: -50.0,
                high: 50.0,
            },
        }
    }
}

impl EarningsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == Some(0) {
            return Err(ConfigError::InvalidValue(
                "earnings interval must be at least 1 turn".to_string(),
            ));
        }
        PercentRange::new(self.surprise.low, self.surprise.high).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsReport {
    pub turn: u64,
    pub surprise: PriceMove,
}

impl EarningsReport {
    pub fn message(&self) -> String {
        format!(
            "Earnings report for {}! Price changes by {:.2}%",
            self.surprise.stock, self.surprise.pct
        )
    }
}

pub struct EarningsScheduler {
    config: EarningsConfig,
    rules: PriceRules,
}

impl EarningsScheduler {
    pub fn new(config: EarningsConfig, rules: PriceRules) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rules })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.interval.is_some()
    }

    /// On report turns, pick one stock at random and apply a surprise move.
    pub fn maybe_report<R: Rng + ?Sized>(
        &self,
        turn: u64,
        stocks: &mut [Stock],
        rng: &mut R,
    ) -> Option<EarningsReport> {
        let interval = u64::from(self.config.interval?);
        if stocks.is_empty() || turn % interval != 0 {
            return None;
        }

        let idx = rng.gen_range(0..stocks.len());
        let pct = self.config.surprise.sample(rng);
        let report = EarningsReport {
            turn,
            surprise: PriceMove::apply(&mut stocks[idx], pct, &self.rules),
        };

        info!(turn, stock = %report.surprise.stock, pct, "Earnings report");
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::RegimeTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn create_test_stocks() -> Vec<Stock> {
        let table = RegimeTable::standard();
        vec![
            Stock::new("BH", dec!(100), &table),
            Stock::new("CD", dec!(250), &table),
        ]
    }

    #[test]
    fn test_disabled_by_default() {
        let scheduler =
            EarningsScheduler::new(EarningsConfig::default(), PriceRules::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut stocks = create_test_stocks();

        assert!(!scheduler.is_enabled());
        assert!((1..=20).all(|turn| scheduler.maybe_report(turn, &mut stocks, &mut rng).is_none()));
    }

    #[test]
    fn test_reports_on_interval_turns_only() {
        let config = EarningsConfig {
            interval: Some(4),
            ..EarningsConfig::default()
        };
        let scheduler = EarningsScheduler::new(config, PriceRules::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut stocks = create_test_stocks();

        let turns: Vec<u64> = (1..=12)
            .filter(|turn| scheduler.maybe_report(*turn, &mut stocks, &mut rng).is_some())
            .collect();
        assert_eq!(turns, vec![4, 8, 12]);

        let total_points: usize = stocks.iter().map(|s| s.history().len()).sum();
        assert_eq!(total_points, 2 + 3);
    }

    #[test]
    fn test_report_message_and_bounds() {
        let config = EarningsConfig {
            interval: Some(1),
            ..EarningsConfig::default()
        };
        let scheduler = EarningsScheduler::new(config, PriceRules::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut stocks = create_test_stocks();

        let report = scheduler.maybe_report(1, &mut stocks, &mut rng).unwrap();
        assert!(report.surprise.pct >= -50.0 && report.surprise.pct <= 50.0);
        assert!(report.message().starts_with(&format!("Earnings report for {}!", report.surprise.stock)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = EarningsConfig {
            interval: Some(0),
            ..EarningsConfig::default()
        };
        assert!(EarningsScheduler::new(config, PriceRules::default()).is_err());
    }
}
