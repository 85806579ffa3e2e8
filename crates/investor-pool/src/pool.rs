use market_core::{round_money, ConfigError, Countdown, TimerRange};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Investor, InvestorView, WithdrawalOutcome};

/// Investor pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorPoolConfig {
    /// Names investors are drawn from; each name is active at most once
    pub roster: Vec<String>,
    /// Principal before the random spread is applied
    pub base_investment: Decimal,
    /// Principal is `base_investment * U(min_factor, max_factor)`
    pub min_factor: f64,
    pub max_factor: f64,
    /// Maximum number of simultaneously active investors
    pub max_investors: usize,
    pub turns_per_year: u64,
    /// Withdrawal probability added per full year invested
    pub withdrawal_chance_per_year: f64,
    /// Countdown drawn at game start
    pub initial_timer: TimerRange,
    /// Countdown drawn after each arrival
    pub reset_timer: TimerRange,
}

impl Default for InvestorPoolConfig {
    fn default() -> Self {
        Self {
            roster: ["Alice", "Bob", "Charlie", "David", "Eve", "Frank"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            base_investment: Decimal::new(1000, 0),
            min_factor: 0.8,
            max_factor: 1.2,
            max_investors: 5,
            turns_per_year: 52,
            withdrawal_chance_per_year: 0.01,
            initial_timer: TimerRange { min: 5, max: 15 },
            reset_timer: TimerRange { min: 10, max: 20 },
        }
    }
}

impl InvestorPoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.initial_timer.validate()?;
        self.reset_timer.validate()?;

        if self.base_investment <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue(
                "base investment must be positive".to_string(),
            ));
        }
        if !(self.min_factor.is_finite()
            && self.max_factor.is_finite()
            && self.min_factor > 0.0
            && self.min_factor <= self.max_factor)
        {
            return Err(ConfigError::InvalidRange(format!(
                "investment factor range ({}, {}) must be finite, positive and ordered",
                self.min_factor, self.max_factor
            )));
        }
        if self.turns_per_year == 0 {
            return Err(ConfigError::InvalidValue(
                "turns per year must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.withdrawal_chance_per_year) {
            return Err(ConfigError::InvalidValue(format!(
                "withdrawal chance per year {} must be within [0, 1]",
                self.withdrawal_chance_per_year
            )));
        }

        let mut names = self.roster.clone();
        names.sort();
        names.dedup();
        if names.len() != self.roster.len() {
            return Err(ConfigError::InvalidValue(
                "investor roster contains duplicate names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Synthetic investor population.
///
/// Investors arrive on a timer and bring principal; each turn every investor
/// may ask for principal plus interest back, with a chance that grows by one
/// step per full year invested.
pub struct InvestorPool {
    config: InvestorPoolConfig,
    active: Vec<Investor>,
    countdown: Countdown,
}

impl InvestorPool {
    pub fn new<R: Rng + ?Sized>(config: InvestorPoolConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;
        let countdown = Countdown::start(&config.initial_timer, rng);
        Ok(Self {
            config,
            active: Vec::new(),
            countdown,
        })
    }

    /// Tick the arrival countdown and admit a new investor when it expires.
    ///
    /// When the pool is full the countdown stays expired, so the next free
    /// slot is filled on the following turn. The caller credits the returned
    /// investor's principal to cash.
    pub fn maybe_arrive<R: Rng + ?Sized>(&mut self, turn: u64, rng: &mut R) -> Option<Investor> {
        if !self.countdown.tick() || self.is_full() {
            return None;
        }

        let investor = self.admit(turn, rng);
        self.countdown.reset(&self.config.reset_timer, rng);
        debug!(next_in = self.countdown.remaining(), "Investor countdown reset");
        investor
    }

    fn admit<R: Rng + ?Sized>(&mut self, turn: u64, rng: &mut R) -> Option<Investor> {
        let available: Vec<&String> = self
            .config
            .roster
            .iter()
            .filter(|name| !self.active.iter().any(|inv| &inv.name == *name))
            .collect();
        let name = (*available.choose(rng)?).clone();

        let factor = rng.gen_range(self.config.min_factor..=self.config.max_factor);
        let principal =
            round_money(self.config.base_investment * Decimal::from_f64(factor).unwrap_or(Decimal::ONE));

        let investor = Investor {
            name,
            principal,
            join_turn: turn,
        };
        info!(investor = %investor.name, turn, "{} invested ${:.2}!", investor.name, principal);
        self.active.push(investor.clone());
        Some(investor)
    }

    /// Give every active investor one chance to withdraw this turn.
    ///
    /// `cash` is the fund's cash before any payout; each payout reduces the
    /// cash available to the investors after it. One uniform draw is made per
    /// investor whether or not it ends up withdrawing.
    pub fn maybe_withdraw<R: Rng + ?Sized>(
        &mut self,
        turn: u64,
        cash: Decimal,
        rng: &mut R,
    ) -> Vec<WithdrawalOutcome> {
        let turns_per_year = self.config.turns_per_year;
        let mut remaining_cash = cash;
        let mut outcomes = Vec::new();
        let mut staying = Vec::with_capacity(self.active.len());

        for investor in std::mem::take(&mut self.active) {
            let years = investor.years_invested(turn, turns_per_year);
            let chance = years as f64 * self.config.withdrawal_chance_per_year;
            let draw: f64 = rng.gen();

            if draw >= chance {
                staying.push(investor);
                continue;
            }

            let owed = investor.owed_amount(turn, turns_per_year);
            if remaining_cash >= owed {
                remaining_cash -= owed;
                info!(investor = %investor.name, years, "Withdrawal paid: ${:.2}", owed);
                outcomes.push(WithdrawalOutcome::Paid {
                    investor,
                    years,
                    amount: owed,
                });
            } else {
                warn!(
                    investor = %investor.name,
                    years,
                    "Not enough cash to pay ${:.2} (have ${:.2})",
                    owed,
                    remaining_cash
                );
                outcomes.push(WithdrawalOutcome::Unpaid {
                    investor: investor.clone(),
                    years,
                    owed,
                });
                staying.push(investor);
            }
        }

        self.active = staying;
        outcomes
    }

    /// Active investors with what each is owed at `turn`
    pub fn snapshot(&self, turn: u64) -> Vec<InvestorView> {
        let turns_per_year = self.config.turns_per_year;
        self.active
            .iter()
            .map(|investor| InvestorView {
                name: investor.name.clone(),
                principal: investor.principal,
                years_invested: investor.years_invested(turn, turns_per_year),
                owed_amount: investor.owed_amount(turn, turns_per_year),
            })
            .collect()
    }

    /// Total owed to every active investor at `turn`
    pub fn total_owed(&self, turn: u64) -> Decimal {
        let turns_per_year = self.config.turns_per_year;
        self.active
            .iter()
            .map(|investor| investor.owed_amount(turn, turns_per_year))
            .sum()
    }

    pub fn active(&self) -> &[Investor] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.active.len() >= self.config.max_investors
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn config(&self) -> &InvestorPoolConfig {
        &self.config
    }
}
