use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// Shares held in one stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub stock: String,
    pub shares: u64,
    /// Weighted average price paid per share
    pub avg_cost_basis: Decimal,
}

impl Position {
    pub fn cost_basis(&self) -> Decimal {
        self.avg_cost_basis * Decimal::from(self.shares)
    }
}

/// Confirmation of a completed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub action: TradeAction,
    pub stock: String,
    pub shares: u64,
    pub unit_price: Decimal,
    /// Cost of a buy or revenue of a sell
    pub total: Decimal,
    pub cash_after: Decimal,
}

impl TradeReceipt {
    pub fn message(&self) -> String {
        match self.action {
            TradeAction::Buy => format!(
                "Bought {} shares of {} for ${:.2}",
                self.shares, self.stock, self.total
            ),
            TradeAction::Sell => format!(
                "Sold {} shares of {} for ${:.2}",
                self.shares, self.stock, self.total
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub stock: String,
    pub shares: u64,
    pub avg_cost_basis: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub positions: Vec<PositionView>,
    pub market_value: Decimal,
    /// Cash plus market value of every position
    pub total_equity: Decimal,
    pub realized_pnl: Decimal,
}
