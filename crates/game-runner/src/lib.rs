//! Headless driver for the stock market game.
//!
//! Runs a [`game_engine::MarketGame`] on its own tokio task and talks to it
//! over a command channel.

pub mod args;
pub mod service;

pub use args::{OrderSide, RunnerArgs, ScriptedOrder};
pub use service::{Command, GameHandle, ServiceSettings, SimulationService};
