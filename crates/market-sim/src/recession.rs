//! Macro recession events.
//!
//! A slow, independent timer that, on expiry, rolls a severity tier and hits
//! every stock with its own draw from that tier's shock range.

use market_core::{
    Band, BandTable, ConfigError, Countdown, PercentRange, PriceRules, Stock, TimerRange,
    ROLL_MAX, ROLL_MIN,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::price_process::PriceMove;

/// Recession severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecessionTier {
    /// False alarm, prices barely move
    Fake,
    StockMarketDip,
    Recession,
    Depression,
}

impl RecessionTier {
    pub const ALL: [RecessionTier; 4] = [
        RecessionTier::Fake,
        RecessionTier::StockMarketDip,
        RecessionTier::Recession,
        RecessionTier::Depression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecessionTier::Fake => "Fake",
            RecessionTier::StockMarketDip => "Stock Market Dip",
            RecessionTier::Recession => "Recession",
            RecessionTier::Depression => "Depression",
        }
    }

    /// Message shown to the player when this tier hits
    pub fn message(&self) -> &'static str {
        match self {
            RecessionTier::Fake => "Get trolled",
            RecessionTier::StockMarketDip => "Stock Market Dip Occurs! Stock Prices Drop!",
            RecessionTier::Recession => "Recession Hits! Stock Prices Drop!",
            RecessionTier::Depression => {
                "Depression Hits! Stock Prices Drop! (Emotional Damage... your bank account is worth as much as a cabbage)"
            }
        }
    }

    /// Default (min%, max%) shock range
    pub fn default_range(&self) -> (f64, f64) {
        match self {
            RecessionTier::Fake => (-1.0, 1.0),
            RecessionTier::StockMarketDip => (-25.0, -3.0),
            RecessionTier::Recession => (-40.0, -30.0),
            RecessionTier::Depression => (-60.0, -50.0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for RecessionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tier probabilities and shock ranges
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityTable {
    bands: BandTable<RecessionTier>,
    ranges: [PercentRange; 4],
}

impl SeverityTable {
    /// 5% fake, 75% dip, 15% recession, 5% depression
    pub fn standard() -> Result<Self, ConfigError> {
        let bands = BandTable::new(vec![
            Band::new(1, 6, RecessionTier::Fake),
            Band::new(6, 81, RecessionTier::StockMarketDip),
            Band::new(81, 96, RecessionTier::Recession),
            Band::new(96, 101, RecessionTier::Depression),
        ])?;
        Self::new(bands, RecessionTier::ALL.map(|tier| tier.default_range()))
    }

    /// Build a table from bands and per-tier `(min%, max%)` ranges indexed
    /// in [`RecessionTier::ALL`] order.
    pub fn new(
        bands: BandTable<RecessionTier>,
        ranges: [(f64, f64); 4],
    ) -> Result<Self, ConfigError> {
        let mut validated = [PercentRange { low: 0.0, high: 0.0 }; 4];
        for (slot, (low, high)) in validated.iter_mut().zip(ranges) {
            *slot = PercentRange::new(low, high)?;
        }
        Ok(Self {
            bands,
            ranges: validated,
        })
    }

    pub fn range(&self, tier: RecessionTier) -> PercentRange {
        self.ranges[tier.index()]
    }

    pub fn bands(&self) -> &BandTable<RecessionTier> {
        &self.bands
    }
}

/// Recession timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionConfig {
    /// Countdown drawn at game start
    pub initial_timer: TimerRange,
    /// Countdown drawn after each recession
    pub reset_timer: TimerRange,
}

impl Default for RecessionConfig {
    fn default() -> Self {
        Self {
            initial_timer: TimerRange { min: 360, max: 480 },
            reset_timer: TimerRange { min: 200, max: 300 },
        }
    }
}

impl RecessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.initial_timer.validate()?;
        self.reset_timer.validate()
    }
}

/// A triggered recession
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecessionEvent {
    pub tier: RecessionTier,
    pub roll: u32,
    pub shocks: Vec<PriceMove>,
}

impl RecessionEvent {
    pub fn message(&self) -> &'static str {
        self.tier.message()
    }
}

/// Recession scheduler
pub struct RecessionScheduler {
    config: RecessionConfig,
    severity: SeverityTable,
    rules: PriceRules,
    countdown: Countdown,
}

impl RecessionScheduler {
    pub fn new<R: Rng + ?Sized>(
        config: RecessionConfig,
        severity: SeverityTable,
        rules: PriceRules,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let countdown = Countdown::start(&config.initial_timer, rng);
        Ok(Self {
            config,
            severity,
            rules,
            countdown,
        })
    }

    /// Tick the countdown; on expiry roll a tier, shock every stock and reset.
    pub fn maybe_trigger<R: Rng + ?Sized>(
        &mut self,
        stocks: &mut [Stock],
        rng: &mut R,
    ) -> Option<RecessionEvent> {
        if !self.countdown.tick() {
            return None;
        }

        let roll = rng.gen_range(ROLL_MIN..=ROLL_MAX);
        let event = self.trigger(roll, stocks, rng);

        self.countdown.reset(&self.config.reset_timer, rng);
        debug!(next_in = self.countdown.remaining(), "Recession countdown reset");
        Some(event)
    }

    /// Resolve `roll` to a tier and apply its shock to every stock right now.
    ///
    /// Rolls outside `[1, 100]` are clamped. Each stock draws its own percentage from the tier's range. Shocked
    /// prices are appended to the history like any other move.
    pub fn trigger<R: Rng + ?Sized>(
        &self,
        roll: u32,
        stocks: &mut [Stock],
        rng: &mut R,
    ) -> RecessionEvent {
        let roll = roll.clamp(ROLL_MIN, ROLL_MAX);
        let tier = self.severity.bands().lookup(roll);
        let range = self.severity.range(tier);
        let shocks: Vec<PriceMove> = stocks
            .iter_mut()
            .map(|stock| {
                let pct = range.sample(rng);
                PriceMove::apply(stock, pct, &self.rules)
            })
            .collect();

        info!(tier = %tier, roll, stocks = shocks.len(), "{}", tier.message());

        RecessionEvent { tier, roll, shocks }
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn severity(&self) -> &SeverityTable {
        &self.severity
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
            Stock::new("Steel", dec!(200), &table),
            Stock::new("Tech", dec!(45.5), &table),
            Stock::new("Food", dec!(1.5), &table),
        ]
    }

    fn fixed_config(turns: u32) -> RecessionConfig {
        RecessionConfig {
            initial_timer: TimerRange { min: turns, max: turns },
            reset_timer: TimerRange { min: 250, max: 250 },
        }
    }

    fn scheduler(turns: u32, rng: &mut StdRng) -> RecessionScheduler {
        RecessionScheduler::new(
            fixed_config(turns),
            SeverityTable::standard().unwrap(),
            PriceRules::default(),
            rng,
        )
        .unwrap()
    }

    #[test]
    fn test_standard_severity_bands() {
        let table = SeverityTable::standard().unwrap();
        assert_eq!(table.bands().lookup(5), RecessionTier::Fake);
        assert_eq!(table.bands().lookup(6), RecessionTier::StockMarketDip);
        assert_eq!(table.bands().lookup(80), RecessionTier::StockMarketDip);
        assert_eq!(table.bands().lookup(81), RecessionTier::Recession);
        assert_eq!(table.bands().lookup(96), RecessionTier::Depression);

        let widths: Vec<u32> = table.bands().bands().iter().map(|b| b.width()).collect();
        assert_eq!(widths, vec![5, 75, 15, 5]);
    }

    #[test]
    fn test_inverted_shock_range_rejected() {
        let bands = SeverityTable::standard().unwrap().bands().clone();
        let result = SeverityTable::new(
            bands,
            [(-1.0, 1.0), (-3.0, -25.0), (-40.0, -30.0), (-60.0, -50.0)],
        );
        assert!(matches!(result, Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn test_triggers_only_on_expiry_then_resets() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut scheduler = scheduler(2, &mut rng);
        let mut stocks = create_test_stocks();

        assert!(scheduler.maybe_trigger(&mut stocks, &mut rng).is_none());
        let event = scheduler.maybe_trigger(&mut stocks, &mut rng).unwrap();
        assert_eq!(event.shocks.len(), 3);
        assert_eq!(event.tier, scheduler.severity().bands().lookup(event.roll));
        assert_eq!(scheduler.countdown().remaining(), 250);
    }

    #[test]
    fn test_depression_shock_within_range_and_floored() {
        let mut rng = StdRng::seed_from_u64(12);
        let scheduler = scheduler(400, &mut rng);
        let mut stocks = create_test_stocks();

        let event = scheduler.trigger(100, &mut stocks, &mut rng);
        assert_eq!(event.tier, RecessionTier::Depression);
        assert_eq!(event.roll, 100);
        for shock in &event.shocks {
            assert!(shock.pct >= -60.0 && shock.pct <= -50.0);
            assert!(shock.to >= dec!(1));
            assert!(shock.to < shock.from || shock.to == dec!(1));
        }
        assert_eq!(stocks[2].price(), dec!(1));
    }

    #[test]
    fn test_shock_appends_to_history() {
        let mut rng = StdRng::seed_from_u64(13);
        let scheduler = scheduler(400, &mut rng);
        let mut stocks = create_test_stocks();

        let event = scheduler.trigger(90, &mut stocks, &mut rng);
        assert_eq!(event.tier, RecessionTier::Recession);
        for stock in &stocks {
            assert_eq!(stock.history().len(), 2);
            assert_eq!(stock.history().last(), Some(stock.price()));
        }
    }

    #[test]
    fn test_each_stock_draws_independently() {
        let mut rng = StdRng::seed_from_u64(21);
        let scheduler = scheduler(400, &mut rng);
        let mut stocks = create_test_stocks();

        let event = scheduler.trigger(50, &mut stocks, &mut rng);
        assert_eq!(event.tier, RecessionTier::StockMarketDip);
        let first = event.shocks[0].pct;
        assert!(event.shocks.iter().any(|s| s.pct != first));
    }

    #[test]
    fn test_forced_trigger_reports_its_roll() {
        let mut rng = StdRng::seed_from_u64(22);
        let scheduler = scheduler(400, &mut rng);
        let mut stocks = create_test_stocks();

        let event = scheduler.trigger(3, &mut stocks, &mut rng);
        assert_eq!((event.roll, event.tier), (3, RecessionTier::Fake));

        let event = scheduler.trigger(250, &mut stocks, &mut rng);
        assert_eq!((event.roll, event.tier), (100, RecessionTier::Depression));
        let event = scheduler.trigger(0, &mut stocks, &mut rng);
        assert_eq!((event.roll, event.tier), (1, RecessionTier::Fake));
    }

    #[test]
    fn test_tier_messages() {
        assert_eq!(RecessionTier::Fake.message(), "Get trolled");
        assert!(RecessionTier::Depression.message().contains("cabbage"));
    }
}
