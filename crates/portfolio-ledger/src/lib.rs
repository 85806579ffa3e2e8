//! Portfolio Ledger
//!
//! Cash, share positions and weighted average cost basis for the player.

pub mod ledger;
pub mod models;

pub use ledger::{parse_quantity, Ledger};
pub use models::*;
