use investor_pool::{Investor, InvestorPool, InvestorView, WithdrawalOutcome};
use market_core::{BandTable, ConfigError, Regime, RegimeTable, Stock, StockQuote, TradeError};
use market_regime::{standard_bands, RegimeChange, RegimeStateMachine};
use market_sim::{
    EarningsReport, EarningsScheduler, PriceMove, PriceProcess, RecessionEvent, RecessionScheduler,
    SeverityTable,
};
use portfolio_ledger::{parse_quantity, Ledger, PortfolioSnapshot, TradeReceipt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::SimulationClock;
use crate::config::GameConfig;

/// Band and range tables driving regimes and recessions
#[derive(Debug, Clone)]
pub struct MarketTables {
    pub regime_bands: BandTable<Regime>,
    pub regime_table: RegimeTable,
    pub severity: SeverityTable,
}

impl MarketTables {
    pub fn standard() -> Result<Self, ConfigError> {
        Ok(Self {
            regime_bands: standard_bands()?,
            regime_table: RegimeTable::standard(),
            severity: SeverityTable::standard()?,
        })
    }
}

/// Everything that happened during one turn, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u64,
    /// One entry per stock on a re-roll turn
    pub regime_changes: Vec<RegimeChange>,
    pub price_moves: Vec<PriceMove>,
    pub recession: Option<RecessionEvent>,
    pub earnings: Option<EarningsReport>,
    pub new_investor: Option<Investor>,
    pub withdrawals: Vec<WithdrawalOutcome>,
    pub messages: Vec<String>,
}

/// Full read-only view of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: u64,
    pub playing: bool,
    pub stocks: Vec<StockQuote>,
    pub portfolio: PortfolioSnapshot,
    pub investors: Vec<InvestorView>,
    pub message: String,
}

/// The stock market game.
///
/// Owns every subsystem and the single RNG they draw from, so a seeded game
/// replays identically as long as the same calls are made in the same order.
pub struct MarketGame {
    pub(crate) config: GameConfig,
    pub(crate) rng: StdRng,
    pub(crate) clock: SimulationClock,
    pub(crate) stocks: Vec<Stock>,
    pub(crate) ledger: Ledger,
    pub(crate) regimes: RegimeStateMachine,
    pub(crate) prices: PriceProcess,
    pub(crate) recessions: RecessionScheduler,
    pub(crate) earnings: EarningsScheduler,
    pub(crate) investors: InvestorPool,
    pub(crate) message: String,
}

impl MarketGame {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_tables(config, MarketTables::standard()?)
    }

    pub fn with_tables(config: GameConfig, tables: MarketTables) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let stocks: Vec<Stock> = config
            .stock_names
            .iter()
            .map(|name| {
                let price = rng.gen_range(config.initial_price_min..=config.initial_price_max);
                Stock::new(name.clone(), Decimal::from(price), &tables.regime_table)
            })
            .collect();

        let regimes = RegimeStateMachine::with_tables(
            config.regime,
            tables.regime_bands,
            tables.regime_table,
            &mut rng,
        )?;
        let recessions =
            RecessionScheduler::new(config.recession, tables.severity, config.price_rules, &mut rng)?;
        let earnings = EarningsScheduler::new(config.earnings, config.price_rules)?;
        let investors = InvestorPool::new(config.investors.clone(), &mut rng)?;

        info!(
            stocks = stocks.len(),
            cash = %config.starting_cash,
            seed = ?config.seed,
            "Market game created"
        );

        Ok(Self {
            ledger: Ledger::new(config.starting_cash),
            prices: PriceProcess::new(config.price_rules),
            clock: SimulationClock::new(),
            message: String::new(),
            config,
            rng,
            stocks,
            regimes,
            recessions,
            earnings,
            investors,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn turn(&self) -> u64 {
        self.clock.turn()
    }

    pub fn cash(&self) -> Decimal {
        self.ledger.cash()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    /// Latest user-facing message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn list_stocks(&self) -> Vec<StockQuote> {
        self.stocks.iter().map(Stock::quote).collect()
    }

    pub fn price_of(&self, name: &str) -> Result<Decimal, TradeError> {
        self.stocks
            .iter()
            .find(|stock| stock.name() == name)
            .map(Stock::price)
            .ok_or_else(|| TradeError::UnknownStock(name.to_string()))
    }

    pub fn history(&self, name: &str) -> Option<&[Decimal]> {
        self.stocks
            .iter()
            .find(|stock| stock.name() == name)
            .map(|stock| stock.history().as_slice())
    }

    /// Percent gain of the held position at today's price; 0 when the
    /// stock is unknown or not held
    pub fn unrealized_percent_change(&self, name: &str) -> f64 {
        self.price_of(name)
            .map(|price| self.ledger.unrealized_percent_change(name, price))
            .unwrap_or(0.0)
    }

    pub fn buy(&mut self, name: &str, shares: i64) -> Result<TradeReceipt, TradeError> {
        let result = self
            .price_of(name)
            .and_then(|price| self.ledger.buy(name, shares, price));
        self.record(result)
    }

    pub fn sell(&mut self, name: &str, shares: i64) -> Result<TradeReceipt, TradeError> {
        let result = self
            .price_of(name)
            .and_then(|price| self.ledger.sell(name, shares, price));
        self.record(result)
    }

    /// Buy using the raw share count typed by the player
    pub fn buy_text(&mut self, name: &str, raw: &str) -> Result<TradeReceipt, TradeError> {
        let result = self.price_of(name).and_then(|price| {
            let shares = parse_quantity(raw)?;
            self.ledger.buy(name, shares, price)
        });
        self.record(result)
    }

    /// Sell using the raw share count typed by the player
    pub fn sell_text(&mut self, name: &str, raw: &str) -> Result<TradeReceipt, TradeError> {
        let result = self.price_of(name).and_then(|price| {
            if self.ledger.position(name).is_none() {
                return Err(TradeError::NoPosition(format!("no shares of {} owned", name)));
            }
            let shares = parse_quantity(raw)?;
            self.ledger.sell(name, shares, price)
        });
        self.record(result)
    }

    fn record(
        &mut self,
        result: Result<TradeReceipt, TradeError>,
    ) -> Result<TradeReceipt, TradeError> {
        match &result {
            Ok(receipt) => self.message = receipt.message(),
            Err(err) => {
                debug!(error = %err, "Trade rejected");
                self.message = err.to_string();
            }
        }
        result
    }

    /// Run one turn when `play` is set; a paused call changes nothing.
    pub fn advance_turn(&mut self, play: bool) -> Option<TurnReport> {
        let turn = self.clock.advance(play)?;
        let mut messages = Vec::new();

        let regime_changes = self.regimes.maybe_update(&mut self.stocks, &mut self.rng);
        let price_moves = self.prices.step_all(&mut self.stocks, &mut self.rng);

        let recession = self.recessions.maybe_trigger(&mut self.stocks, &mut self.rng);
        if let Some(event) = &recession {
            messages.push(event.message().to_string());
        }

        let earnings = self
            .earnings
            .maybe_report(turn, &mut self.stocks, &mut self.rng);
        if let Some(report) = &earnings {
            messages.push(report.message());
        }

        let new_investor = self.investors.maybe_arrive(turn, &mut self.rng);
        if let Some(investor) = &new_investor {
            self.ledger.credit(investor.principal);
            messages.push(format!("{} invested ${:.2}!", investor.name, investor.principal));
        }

        let withdrawals = self
            .investors
            .maybe_withdraw(turn, self.ledger.cash(), &mut self.rng);
        for outcome in &withdrawals {
            if let WithdrawalOutcome::Paid { amount, .. } = outcome {
                if let Err(err) = self.ledger.debit(*amount) {
                    warn!(error = %err, "Investor payout exceeded cash");
                }
            }
            messages.push(outcome.message());
        }

        if let Some(last) = messages.last() {
            self.message = last.clone();
        }

        debug!(turn, cash = %self.ledger.cash(), events = messages.len(), "Turn complete");

        Some(TurnReport {
            turn,
            regime_changes,
            price_moves,
            recession,
            earnings,
            new_investor,
            withdrawals,
            messages,
        })
    }

    /// Advance one turn if the clock is playing
    pub fn tick(&mut self) -> Option<TurnReport> {
        let playing = self.clock.is_playing();
        self.advance_turn(playing)
    }

    pub fn portfolio_snapshot(&self) -> PortfolioSnapshot {
        self.ledger.snapshot(|name| self.price_of(name).ok())
    }

    pub fn investor_snapshot(&self) -> Vec<InvestorView> {
        self.investors.snapshot(self.clock.turn())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            turn: self.clock.turn(),
            playing: self.clock.is_playing(),
            stocks: self.list_stocks(),
            portfolio: self.portfolio_snapshot(),
            investors: self.investor_snapshot(),
            message: self.message.clone(),
        }
    }
}
