//! Economic regime state machine.
//!
//! Every stock carries a [`Regime`] that decides its per-turn volatility
//! range. On a slow timer the whole market is re-rolled: each stock draws an
//! independent roll in `[1, 100]` that the band table maps onto a regime.

use market_core::{Band, BandTable, ConfigError, Countdown, Regime, RegimeTable, Stock, TimerRange};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Regime timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Turns between re-rolls (used for the first countdown and every reset)
    pub timer: TimerRange,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            timer: TimerRange { min: 30, max: 40 },
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timer.validate()
    }
}

/// Default roll → regime bands, half-open `[start, end)`
pub fn standard_bands() -> Result<BandTable<Regime>, ConfigError> {
    BandTable::new(vec![
        Band::new(1, 35, Regime::Standard),
        Band::new(35, 45, Regime::GoodStandard),
        Band::new(45, 55, Regime::BadStandard),
        Band::new(55, 60, Regime::GreatUpturn),
        Band::new(60, 66, Regime::OkUpturn),
        Band::new(66, 71, Regime::Upturn),
        Band::new(71, 76, Regime::Downturn),
        Band::new(76, 83, Regime::GoodDownturn),
        Band::new(83, 87, Regime::BankAccountCooked),
        Band::new(87, 90, Regime::ToTheSky),
        Band::new(90, 93, Regime::GeopoliticalTensions),
        Band::new(93, 101, Regime::Medium),
    ])
}

/// One stock's re-roll outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeChange {
    pub stock: String,
    pub roll: u32,
    pub from: Regime,
    pub to: Regime,
}

impl RegimeChange {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Regime state machine
pub struct RegimeStateMachine {
    config: RegimeConfig,
    bands: BandTable<Regime>,
    table: RegimeTable,
    countdown: Countdown,
}

impl RegimeStateMachine {
    /// Create a state machine with the default bands and regime table
    pub fn new<R: Rng + ?Sized>(config: RegimeConfig, rng: &mut R) -> Result<Self, ConfigError> {
        Self::with_tables(config, standard_bands()?, RegimeTable::standard(), rng)
    }

    pub fn with_tables<R: Rng + ?Sized>(
        config: RegimeConfig,
        bands: BandTable<Regime>,
        table: RegimeTable,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        table.validate()?;
        let countdown = Countdown::start(&config.timer, rng);
        Ok(Self {
            config,
            bands,
            table,
            countdown,
        })
    }

    /// Tick the countdown; when it expires, re-roll every stock and reset it.
    ///
    /// Returns one entry per stock on a re-roll turn, nothing otherwise.
    pub fn maybe_update<R: Rng + ?Sized>(
        &mut self,
        stocks: &mut [Stock],
        rng: &mut R,
    ) -> Vec<RegimeChange> {
        if !self.countdown.tick() {
            return Vec::new();
        }

        let changes = self.reassign_all(stocks, rng);
        self.countdown.reset(&self.config.timer, rng);
        debug!(next_in = self.countdown.remaining(), "Regime countdown reset");
        changes
    }

    /// Re-roll every stock's regime immediately, without touching the countdown.
    pub fn reassign_all<R: Rng + ?Sized>(
        &self,
        stocks: &mut [Stock],
        rng: &mut R,
    ) -> Vec<RegimeChange> {
        stocks
            .iter_mut()
            .map(|stock| {
                let from = stock.regime();
                let (roll, to) = self.bands.roll(rng);
                stock.set_regime(to, &self.table);

                if from != to {
                    info!(stock = stock.name(), roll, "Regime {} -> {}", from, to);
                } else {
                    debug!(stock = stock.name(), roll, "Regime stays {}", to);
                }

                RegimeChange {
                    stock: stock.name().to_string(),
                    roll,
                    from,
                    to,
                }
            })
            .collect()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn table(&self) -> &RegimeTable {
        &self.table
    }

    pub fn bands(&self) -> &BandTable<Regime> {
        &self.bands
    }
}
