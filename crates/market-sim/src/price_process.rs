use market_core::{PriceRules, Stock};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One applied percentage move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMove {
    pub stock: String,
    pub pct: f64,
    pub from: Decimal,
    pub to: Decimal,
}

impl PriceMove {
    /// Apply `pct` to the stock and record the move
    pub fn apply(stock: &mut Stock, pct: f64, rules: &PriceRules) -> Self {
        let from = stock.price();
        let to = stock.apply_change(pct, rules);
        Self {
            stock: stock.name().to_string(),
            pct,
            from,
            to,
        }
    }
}

/// Per-turn random walk driven by each stock's regime volatility
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceProcess {
    rules: PriceRules,
}

impl PriceProcess {
    pub fn new(rules: PriceRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PriceRules {
        &self.rules
    }

    /// Draw a change from the stock's volatility range and apply it.
    pub fn step<R: Rng + ?Sized>(&self, stock: &mut Stock, rng: &mut R) -> PriceMove {
        let pct = stock.volatility().sample(rng);
        let price_move = PriceMove::apply(stock, pct, &self.rules);
        debug!(
            stock = %price_move.stock,
            pct = price_move.pct,
            "Price {} -> {}",
            price_move.from,
            price_move.to
        );
        price_move
    }

    /// Step every stock once, in order.
    pub fn step_all<R: Rng + ?Sized>(&self, stocks: &mut [Stock], rng: &mut R) -> Vec<PriceMove> {
        stocks.iter_mut().map(|stock| self.step(stock, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{Regime, RegimeTable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_step_stays_within_regime_range() {
        let table = RegimeTable::standard();
        let process = PriceProcess::default();
        let mut rng = StdRng::seed_from_u64(17);

        for regime in Regime::ALL {
            let mut stock = Stock::new("Cars", dec!(150), &table);
            stock.set_regime(regime, &table);
            for _ in 0..100 {
                let price_move = process.step(&mut stock, &mut rng);
                assert!(table.range(regime).contains(price_move.pct));
            }
        }
    }

    #[test]
    fn test_price_never_drops_below_floor() {
        let table = RegimeTable::standard();
        let process = PriceProcess::default();
        let mut rng = StdRng::seed_from_u64(23);
        let mut stock = Stock::new("Aviation", dec!(1.50), &table);
        stock.set_regime(Regime::BankAccountCooked, &table);

        for _ in 0..2_000 {
            process.step(&mut stock, &mut rng);
            assert!(stock.price() >= dec!(1));
        }
        assert_eq!(stock.price(), dec!(1));
    }

    #[test]
    fn test_prices_keep_two_decimals() {
        let table = RegimeTable::standard();
        let process = PriceProcess::default();
        let mut rng = StdRng::seed_from_u64(29);
        let mut stock = Stock::new("Food", dec!(87), &table);
        stock.set_regime(Regime::ToTheSky, &table);

        for _ in 0..200 {
            let price_move = process.step(&mut stock, &mut rng);
            assert_eq!(price_move.to, price_move.to.round_dp(2));
        }
    }

    #[test]
    fn test_step_all_appends_one_point_per_stock() {
        let table = RegimeTable::standard();
        let process = PriceProcess::default();
        let mut rng = StdRng::seed_from_u64(31);
        let mut stocks = vec![
            Stock::new("Steel", dec!(20), &table),
            Stock::new("Tech", dec!(300), &table),
        ];

        let moves = process.step_all(&mut stocks, &mut rng);
        assert_eq!(moves.len(), 2);
        for (stock, price_move) in stocks.iter().zip(&moves) {
            assert_eq!(stock.history().len(), 2);
            assert_eq!(stock.history().last(), Some(price_move.to));
        }
    }
}
