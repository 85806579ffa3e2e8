use rust_decimal::Decimal;
use thiserror::Error;

/// Recoverable errors raised by player trades.
///
/// None of these abort a turn; the engine turns them into a message for the
/// player and leaves cash and holdings untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("Invalid number of shares: {0}")]
    InvalidQuantity(String),

    #[error("Not enough cash! Need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("No position: {0}")]
    NoPosition(String),

    #[error("Unknown stock: {0}")]
    UnknownStock(String),
}

/// Errors raised while building tables, timers or configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid band table: {0}")]
    InvalidBands(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
