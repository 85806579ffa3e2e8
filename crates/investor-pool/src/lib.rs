//! Investor Pool
//!
//! Synthetic investors who put money into the player's fund and later ask
//! for it back with interest.

pub mod models;
pub mod pool;

pub use models::{owed_percentage, Investor, InvestorView, WithdrawalOutcome};
pub use pool::{InvestorPool, InvestorPoolConfig};
