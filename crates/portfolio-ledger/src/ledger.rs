use std::collections::BTreeMap;

use market_core::TradeError;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use tracing::info;

use crate::models::*;

/// Parse share-count text typed by the player.
pub fn parse_quantity(raw: &str) -> Result<i64, TradeError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| TradeError::InvalidQuantity(raw.to_string()))
}

fn positive_shares(shares: i64) -> Result<u64, TradeError> {
    u64::try_from(shares)
        .ok()
        .filter(|shares| *shares > 0)
        .ok_or_else(|| TradeError::InvalidQuantity(shares.to_string()))
}

/// Player cash, holdings and cost basis.
///
/// Every operation either succeeds completely or leaves the ledger untouched.
#[derive(Debug, Clone)]
pub struct Ledger {
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    realized_pnl: Decimal,
}

impl Ledger {
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            cash: starting_cash,
            positions: BTreeMap::new(),
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Buy `shares` at `unit_price`, updating the weighted average basis
    pub fn buy(
        &mut self,
        stock: &str,
        shares: i64,
        unit_price: Decimal,
    ) -> Result<TradeReceipt, TradeError> {
        let shares = positive_shares(shares)?;
        let too_many = || TradeError::InvalidQuantity(shares.to_string());
        let cost = unit_price
            .checked_mul(Decimal::from(shares))
            .ok_or_else(too_many)?;

        if cost > self.cash {
            return Err(TradeError::InsufficientFunds {
                needed: cost,
                available: self.cash,
            });
        }

        // work out the new position first so an overflow changes nothing
        let (held, basis) = self
            .positions
            .get(stock)
            .map_or((0, Decimal::ZERO), |position| {
                (position.shares, position.avg_cost_basis)
            });
        let total_shares = held.checked_add(shares).ok_or_else(too_many)?;
        let avg_cost_basis = basis
            .checked_mul(Decimal::from(held))
            .and_then(|prev_total| prev_total.checked_add(cost))
            .and_then(|total| total.checked_div(Decimal::from(total_shares)))
            .ok_or_else(too_many)?;

        self.cash -= cost;
        self.positions.insert(
            stock.to_string(),
            Position {
                stock: stock.to_string(),
                shares: total_shares,
                avg_cost_basis,
            },
        );

        info!(stock, shares, price = %unit_price, "Bought for ${:.2}", cost);

        Ok(TradeReceipt {
            action: TradeAction::Buy,
            stock: stock.to_string(),
            shares,
            unit_price,
            total: cost,
            cash_after: self.cash,
        })
    }

    /// Sell `shares` at `unit_price`; the position is dropped at zero shares
    pub fn sell(
        &mut self,
        stock: &str,
        shares: i64,
        unit_price: Decimal,
    ) -> Result<TradeReceipt, TradeError> {
        let held = self
            .positions
            .get(stock)
            .map(|position| position.shares)
            .ok_or_else(|| TradeError::NoPosition(format!("no shares of {} owned", stock)))?;

        let shares = positive_shares(shares)?;
        if shares > held {
            return Err(TradeError::NoPosition(format!(
                "not enough shares of {} to sell ({} held, {} requested)",
                stock, held, shares
            )));
        }

        let revenue = unit_price
            .checked_mul(Decimal::from(shares))
            .ok_or_else(|| TradeError::InvalidQuantity(shares.to_string()))?;
        let mut emptied = false;
        if let Some(position) = self.positions.get_mut(stock) {
            self.realized_pnl += (unit_price - position.avg_cost_basis) * Decimal::from(shares);
            position.shares -= shares;
            emptied = position.shares == 0;
        }
        if emptied {
            self.positions.remove(stock);
        }
        self.cash += revenue;

        info!(stock, shares, price = %unit_price, "Sold for ${:.2}", revenue);

        Ok(TradeReceipt {
            action: TradeAction::Sell,
            stock: stock.to_string(),
            shares,
            unit_price,
            total: revenue,
            cash_after: self.cash,
        })
    }

    /// Add cash from outside the market (investor principal)
    pub fn credit(&mut self, amount: Decimal) {
        self.cash += amount;
    }

    /// Remove cash for a payout; fails without touching cash when short
    pub fn debit(&mut self, amount: Decimal) -> Result<(), TradeError> {
        if amount > self.cash {
            return Err(TradeError::InsufficientFunds {
                needed: amount,
                available: self.cash,
            });
        }
        self.cash -= amount;
        Ok(())
    }

    pub fn position(&self, stock: &str) -> Option<&Position> {
        self.positions.get(stock)
    }

    /// Positions ordered by stock name
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// `(current - basis) / basis * 100`, or 0 when nothing is held
    pub fn unrealized_percent_change(&self, stock: &str, current_price: Decimal) -> f64 {
        match self.positions.get(stock) {
            Some(position) if position.avg_cost_basis > Decimal::ZERO => {
                ((current_price - position.avg_cost_basis) / position.avg_cost_basis
                    * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Portfolio summary priced with `price_of`; positions with no price are
    /// valued at their cost basis.
    pub fn snapshot<F>(&self, price_of: F) -> PortfolioSnapshot
    where
        F: Fn(&str) -> Option<Decimal>,
    {
        let mut market_value = Decimal::ZERO;
        let positions: Vec<PositionView> = self
            .positions
            .values()
            .map(|position| {
                let current_price = price_of(&position.stock).unwrap_or(position.avg_cost_basis);
                let value = current_price * Decimal::from(position.shares);
                market_value += value;
                PositionView {
                    stock: position.stock.clone(),
                    shares: position.shares,
                    avg_cost_basis: position.avg_cost_basis,
                    current_price,
                    market_value: value,
                    unrealized_pnl: value - position.cost_basis(),
                    unrealized_pnl_percent: self
                        .unrealized_percent_change(&position.stock, current_price),
                }
            })
            .collect();

        PortfolioSnapshot {
            cash: self.cash,
            positions,
            market_value,
            total_equity: self.cash + market_value,
            realized_pnl: self.realized_pnl,
        }
    }
}
