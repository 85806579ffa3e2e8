//! Stock Market Game Engine
//!
//! Ties the market, investor and ledger crates together behind a single
//! [`MarketGame`] that advances one turn at a time.

pub mod clock;
pub mod config;
pub mod game;

pub use clock::SimulationClock;
pub use config::GameConfig;
pub use game::{GameSnapshot, MarketGame, MarketTables, TurnReport};

pub use investor_pool::{InvestorView, WithdrawalOutcome};
pub use market_core::{Regime, StockQuote, TradeError};
pub use portfolio_ledger::{PortfolioSnapshot, TradeReceipt};
