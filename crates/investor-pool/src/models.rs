use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Interest owed on top of principal after `years` full years.
///
/// Step function: nothing before year 5, 20% from year 5, 40% from year 10.
pub fn owed_percentage(years: u64) -> Decimal {
    if years >= 10 {
        Decimal::new(40, 2)
    } else if years >= 5 {
        Decimal::new(20, 2)
    } else {
        Decimal::ZERO
    }
}

/// A synthetic investor holding money in the player's fund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub name: String,
    pub principal: Decimal,
    pub join_turn: u64,
}

impl Investor {
    /// Full years elapsed since joining
    pub fn years_invested(&self, turn: u64, turns_per_year: u64) -> u64 {
        turn.saturating_sub(self.join_turn) / turns_per_year.max(1)
    }

    /// Principal plus the interest owed at `turn`
    pub fn owed_amount(&self, turn: u64, turns_per_year: u64) -> Decimal {
        let years = self.years_invested(turn, turns_per_year);
        self.principal * (Decimal::ONE + owed_percentage(years))
    }
}

/// Read-only investor view handed to the outer collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorView {
    pub name: String,
    pub principal: Decimal,
    pub years_invested: u64,
    pub owed_amount: Decimal,
}

/// Result of an investor deciding to withdraw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WithdrawalOutcome {
    /// Investor was paid and left the pool
    Paid {
        investor: Investor,
        years: u64,
        amount: Decimal,
    },
    /// Cash could not cover the payout; the investor stays
    Unpaid {
        investor: Investor,
        years: u64,
        owed: Decimal,
    },
}

impl WithdrawalOutcome {
    pub fn message(&self) -> String {
        match self {
            WithdrawalOutcome::Paid {
                investor,
                years,
                amount,
            } => format!(
                "{} withdrew ${:.2} after {} years.",
                investor.name, amount, years
            ),
            WithdrawalOutcome::Unpaid { investor, .. } => {
                format!("Not enough cash to pay {}!", investor.name)
            }
        }
    }

    /// Cash leaving the fund
    pub fn paid_amount(&self) -> Decimal {
        match self {
            WithdrawalOutcome::Paid { amount, .. } => *amount,
            WithdrawalOutcome::Unpaid { .. } => Decimal::ZERO,
        }
    }
}
