use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use investor_pool::InvestorPoolConfig;
use market_core::{ConfigError, PercentRange, PriceRules, TimerRange};
use market_regime::RegimeConfig;
use market_sim::{EarningsConfig, RecessionConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STOCKS: [&str; 6] = ["Steel", "Tech", "Food", "Gold", "Aviation", "Cars"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub starting_cash: Decimal,
    pub stock_names: Vec<String>,

    // Initial prices are whole dollars drawn from this inclusive range
    pub initial_price_min: u32,
    pub initial_price_max: u32,

    pub price_rules: PriceRules,
    pub regime: RegimeConfig,
    pub recession: RecessionConfig,
    pub earnings: EarningsConfig,
    pub investors: InvestorPoolConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            starting_cash: Decimal::new(10000, 0),
            stock_names: DEFAULT_STOCKS.iter().map(|s| s.to_string()).collect(),
            initial_price_min: 20,
            initial_price_max: 300,
            price_rules: PriceRules::default(),
            regime: RegimeConfig::default(),
            recession: RecessionConfig::default(),
            earnings: EarningsConfig::default(),
            investors: InvestorPoolConfig::default(),
        }
    }
}

/// Read `key`, falling back to `default` when unset
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_list(key: &str, default: &[String]) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| default.to_vec())
}

fn env_timer(prefix: &str, default: TimerRange) -> Result<TimerRange> {
    Ok(TimerRange {
        min: env_or(&format!("{}_MIN", prefix), default.min)?,
        max: env_or(&format!("{}_MAX", prefix), default.max)?,
    })
}

impl GameConfig {
    /// Build a configuration from environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let seed = match env::var("GAME_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("GAME_SEED has invalid value {:?}", raw))?,
            ),
            Err(_) => defaults.seed,
        };

        let earnings_interval = match env::var("EARNINGS_INTERVAL") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("EARNINGS_INTERVAL has invalid value {:?}", raw))?,
            ),
            Err(_) => defaults.earnings.interval,
        };

        let config = Self {
            seed,
            starting_cash: env_or("STARTING_CASH", defaults.starting_cash)?,
            stock_names: env_list("STOCK_NAMES", &defaults.stock_names),
            initial_price_min: env_or("INITIAL_PRICE_MIN", defaults.initial_price_min)?,
            initial_price_max: env_or("INITIAL_PRICE_MAX", defaults.initial_price_max)?,

            price_rules: PriceRules {
                floor: env_or("MIN_PRICE", defaults.price_rules.floor)?,
                ceiling: env_or("MAX_PRICE", defaults.price_rules.ceiling)?,
                ..defaults.price_rules
            },

            regime: RegimeConfig {
                timer: env_timer("REGIME_TIMER", defaults.regime.timer)?,
            },

            recession: RecessionConfig {
                initial_timer: env_timer(
                    "RECESSION_TIMER_INITIAL",
                    defaults.recession.initial_timer,
                )?,
                reset_timer: env_timer("RECESSION_TIMER_RESET", defaults.recession.reset_timer)?,
            },

            earnings: EarningsConfig {
                interval: earnings_interval,
                ..defaults.earnings
            },

            investors: InvestorPoolConfig {
                roster: env_list("INVESTOR_NAMES", &defaults.investors.roster),
                base_investment: env_or("INVESTOR_BASE_AMOUNT", defaults.investors.base_investment)?,
                max_investors: env_or("INVESTOR_MAX", defaults.investors.max_investors)?,
                turns_per_year: env_or("TURNS_PER_YEAR", defaults.investors.turns_per_year)?,
                initial_timer: env_timer(
                    "INVESTOR_TIMER_INITIAL",
                    defaults.investors.initial_timer,
                )?,
                reset_timer: env_timer("INVESTOR_TIMER_RESET", defaults.investors.reset_timer)?,
                ..defaults.investors
            },
        };

        config.validate().context("invalid game configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_cash < Decimal::ZERO {
            return Err(ConfigError::InvalidValue(format!(
                "starting cash {} is negative",
                self.starting_cash
            )));
        }
        if self.stock_names.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one stock is required".to_string(),
            ));
        }
        for (i, name) in self.stock_names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "stock names must not be blank".to_string(),
                ));
            }
            if self.stock_names[..i].contains(name) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate stock name {}",
                    name
                )));
            }
        }
        if self.initial_price_min == 0 || self.initial_price_min > self.initial_price_max {
            return Err(ConfigError::InvalidRange(format!(
                "initial price range {}..={} must be positive and ordered",
                self.initial_price_min, self.initial_price_max
            )));
        }

        self.price_rules.validate()?;
        self.regime.validate()?;
        self.recession.validate()?;
        self.earnings.validate()?;
        self.investors.validate()?;
        Ok(())
    }

    /// Same configuration with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same configuration with the earnings surprise range replaced
    pub fn with_earnings(mut self, interval: u32, surprise: PercentRange) -> Self {
        self.earnings = EarningsConfig {
            interval: Some(interval),
            surprise,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_matches_game_constants() {
        let config = GameConfig::default();
        assert_eq!(config.starting_cash, dec!(10000));
        assert_eq!(config.stock_names.len(), 6);
        assert_eq!(config.regime.timer, TimerRange { min: 30, max: 40 });
        assert_eq!(config.investors.max_investors, 5);
        assert!(config.earnings.interval.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = GameConfig {
            stock_names: vec!["Tech".to_string(), "Tech".to_string()],
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            initial_price_min: 300,
            initial_price_max: 20,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            stock_names: Vec::new(),
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.regime.timer = TimerRange { min: 0, max: 5 };
        assert!(config.validate().is_err());
    }

    // Only test that touches the process environment
    #[test]
    fn test_from_env_overrides_defaults() {
        env::set_var("GAME_SEED", "42");
        env::set_var("STARTING_CASH", "2500.50");
        env::set_var("STOCK_NAMES", "Oil, Rail ,");
        env::set_var("REGIME_TIMER_MIN", "3");
        env::set_var("REGIME_TIMER_MAX", "4");
        env::set_var("EARNINGS_INTERVAL", "10");

        let config = GameConfig::from_env().unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.starting_cash, dec!(2500.50));
        assert_eq!(config.stock_names, vec!["Oil", "Rail"]);
        assert_eq!(config.regime.timer, TimerRange { min: 3, max: 4 });
        assert_eq!(config.earnings.interval, Some(10));
        assert_eq!(config.investors, InvestorPoolConfig::default());

        env::set_var("REGIME_TIMER_MIN", "five");
        assert!(GameConfig::from_env().is_err());

        env::set_var("REGIME_TIMER_MIN", "9");
        assert!(GameConfig::from_env().is_err());

        for key in [
            "GAME_SEED",
            "STARTING_CASH",
            "STOCK_NAMES",
            "REGIME_TIMER_MIN",
            "REGIME_TIMER_MAX",
            "EARNINGS_INTERVAL",
        ] {
            env::remove_var(key);
        }
    }
}
