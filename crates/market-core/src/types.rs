use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::money::{PercentRange, PriceRules};

/// Per-stock economic status.
///
/// Each regime owns a per-turn percentage-change range in the [`RegimeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    Standard,
    GoodStandard,
    BadStandard,
    GreatUpturn,
    OkUpturn,
    Upturn,
    Downturn,
    GoodDownturn,
    /// Prolonged slide, named after what it does to the player's savings
    BankAccountCooked,
    /// Sharp rally
    ToTheSky,
    GeopoliticalTensions,
    /// Near-flat trading
    Medium,
}

impl Regime {
    pub const ALL: [Regime; 12] = [
        Regime::Standard,
        Regime::GoodStandard,
        Regime::BadStandard,
        Regime::GreatUpturn,
        Regime::OkUpturn,
        Regime::Upturn,
        Regime::Downturn,
        Regime::GoodDownturn,
        Regime::BankAccountCooked,
        Regime::ToTheSky,
        Regime::GeopoliticalTensions,
        Regime::Medium,
    ];

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Regime::Standard => "Standard",
            Regime::GoodStandard => "Good Standard",
            Regime::BadStandard => "Bad Standard",
            Regime::GreatUpturn => "Great Upturn",
            Regime::OkUpturn => "Ok Upturn",
            Regime::Upturn => "Upturn",
            Regime::Downturn => "Downturn",
            Regime::GoodDownturn => "Good Downturn",
            Regime::BankAccountCooked => "Bank Account == Cooked",
            Regime::ToTheSky => "TO THE SKY",
            Regime::GeopoliticalTensions => "Geopolitical Tensions",
            Regime::Medium => "Medium",
        }
    }

    /// Default per-turn (low%, high%) change range
    pub fn default_range(&self) -> (f64, f64) {
        match self {
            Regime::Standard => (-0.05, 0.35),
            Regime::GoodStandard => (-0.025, 0.65),
            Regime::BadStandard => (-0.45, 0.375),
            Regime::GreatUpturn => (-0.015, 1.657285),
            Regime::OkUpturn => (-0.025, 1.285),
            Regime::Upturn => (-0.05, 0.785),
            Regime::Downturn => (-1.25, -0.005),
            Regime::GoodDownturn => (-0.7225, -0.005),
            Regime::BankAccountCooked => (-2.25, -0.35),
            Regime::ToTheSky => (0.5, 4.25),
            Regime::GeopoliticalTensions => (-0.55, -0.5),
            Regime::Medium => (-0.005, 0.005),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Exhaustive regime → volatility range mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeTable {
    ranges: [PercentRange; 12],
}

impl RegimeTable {
    /// Table built from [`Regime::default_range`].
    pub fn standard() -> Self {
        let ranges = Regime::ALL.map(|regime| {
            let (low, high) = regime.default_range();
            PercentRange { low, high }
        });
        Self { ranges }
    }

    /// Replace one regime's range, rejecting inverted or non-finite ranges.
    pub fn with_range(mut self, regime: Regime, range: PercentRange) -> Result<Self, ConfigError> {
        self.ranges[regime.index()] = PercentRange::new(range.low, range.high)?;
        Ok(self)
    }

    /// Check every regime's range is finite and ordered
    pub fn validate(&self) -> Result<(), ConfigError> {
        for regime in Regime::ALL {
            let range = self.range(regime);
            PercentRange::new(range.low, range.high).map_err(|err| {
                ConfigError::InvalidRange(format!("{} regime: {}", regime, err))
            })?;
        }
        Ok(())
    }

    pub fn range(&self, regime: Regime) -> PercentRange {
        self.ranges[regime.index()]
    }
}

impl Default for RegimeTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Append-only price history of one stock, used for charting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    points: Vec<Decimal>,
}

impl HistoricalSeries {
    pub fn new(initial: Decimal) -> Self {
        Self {
            points: vec![initial],
        }
    }

    fn push(&mut self, price: Decimal) {
        self.points.push(price);
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<Decimal> {
        self.points.last().copied()
    }
}

/// A tradable stock.
///
/// Prices only move through [`Stock::apply_change`], which keeps the price on
/// the configured floor and precision and records every move in the history.
#[derive(Debug, Clone)]
pub struct Stock {
    name: String,
    price: Decimal,
    regime: Regime,
    volatility: PercentRange,
    history: HistoricalSeries,
}

impl Stock {
    pub fn new(name: impl Into<String>, price: Decimal, table: &RegimeTable) -> Self {
        let regime = Regime::Standard;
        Self {
            name: name.into(),
            price,
            regime,
            volatility: table.range(regime),
            history: HistoricalSeries::new(price),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn volatility(&self) -> PercentRange {
        self.volatility
    }

    pub fn history(&self) -> &HistoricalSeries {
        &self.history
    }

    /// Switch regime and refresh the volatility range from the table.
    pub fn set_regime(&mut self, regime: Regime, table: &RegimeTable) {
        self.regime = regime;
        self.volatility = table.range(regime);
    }

    /// Move the price by `pct` percent and append the result to the history.
    pub fn apply_change(&mut self, pct: f64, rules: &PriceRules) -> Decimal {
        self.price = rules.apply_percent(self.price, pct);
        self.history.push(self.price);
        self.price
    }

    pub fn quote(&self) -> StockQuote {
        StockQuote {
            name: self.name.clone(),
            price: self.price,
            regime: self.regime,
        }
    }
}

/// Read-only view of a stock handed to the outer collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub name: String,
    pub price: Decimal,
    pub regime: Regime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_table_ranges_are_ordered() {
        let table = RegimeTable::standard();
        for regime in Regime::ALL {
            let range = table.range(regime);
            assert!(
                PercentRange::new(range.low, range.high).is_ok(),
                "{} has inverted range",
                regime
            );
        }
    }

    #[test]
    fn test_table_lookup_matches_regime() {
        let table = RegimeTable::standard();
        assert_eq!(table.range(Regime::ToTheSky), PercentRange { low: 0.5, high: 4.25 });
        assert_eq!(table.range(Regime::Downturn), PercentRange { low: -1.25, high: -0.005 });
    }

    #[test]
    fn test_with_range_overrides_single_regime() {
        let flat = PercentRange::new(0.0, 0.0).unwrap();
        let table = RegimeTable::standard().with_range(Regime::Medium, flat).unwrap();
        assert_eq!(table.range(Regime::Medium), flat);
        assert_eq!(table.range(Regime::Standard), RegimeTable::standard().range(Regime::Standard));
    }

    #[test]
    fn test_new_stock_starts_standard_with_seeded_history() {
        let stock = Stock::new("Steel", dec!(120), &RegimeTable::standard());
        assert_eq!(stock.regime(), Regime::Standard);
        assert_eq!(stock.volatility(), RegimeTable::standard().range(Regime::Standard));
        assert_eq!(stock.history().as_slice(), &[dec!(120)]);
    }

    #[test]
    fn test_set_regime_refreshes_volatility() {
        let table = RegimeTable::standard();
        let mut stock = Stock::new("Gold", dec!(50), &table);
        stock.set_regime(Regime::BankAccountCooked, &table);
        assert_eq!(stock.regime(), Regime::BankAccountCooked);
        assert_eq!(stock.volatility(), table.range(Regime::BankAccountCooked));
    }

    #[test]
    fn test_apply_change_appends_history() {
        let mut stock = Stock::new("Tech", dec!(100), &RegimeTable::standard());
        let rules = PriceRules::default();
        stock.apply_change(20.0, &rules);
        stock.apply_change(-50.0, &rules);
        assert_eq!(stock.price(), dec!(60));
        assert_eq!(stock.history().as_slice(), &[dec!(100), dec!(120), dec!(60)]);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let inverted = PercentRange { low: 2.0, high: -1.0 };
        let result = RegimeTable::standard().with_range(Regime::Standard, inverted);
        assert!(matches!(result, Err(ConfigError::InvalidRange(_))));

        let mut table = RegimeTable::standard();
        table.ranges[Regime::ToTheSky.index()] = inverted;
        assert!(table.validate().is_err());
        assert!(RegimeTable::standard().validate().is_ok());
    }

    #[test]
    fn test_regime_names() {
        assert_eq!(Regime::BankAccountCooked.to_string(), "Bank Account == Cooked");
        assert_eq!(Regime::ToTheSky.name(), "TO THE SKY");
    }
}
