use std::time::Duration;

use anyhow::{anyhow, Result};
use game_engine::{GameSnapshot, MarketGame, TradeError, TradeReceipt, TurnReport};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::args::{OrderSide, ScriptedOrder};

type TradeReply = oneshot::Sender<Result<TradeReceipt, TradeError>>;

/// Requests handled by the simulation task
#[derive(Debug)]
pub enum Command {
    Buy {
        stock: String,
        shares: String,
        reply: TradeReply,
    },
    Sell {
        stock: String,
        shares: String,
        reply: TradeReply,
    },
    Play,
    Pause,
    /// Run exactly one turn, even while paused; answers `None` once the
    /// turn limit is reached
    Step {
        reply: oneshot::Sender<Option<TurnReport>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub tick: Duration,
    /// Stop after this many ticks; `None` runs until shutdown
    pub max_turns: Option<u64>,
    /// Sorted by turn
    pub orders: Vec<ScriptedOrder>,
    pub start_playing: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            max_turns: None,
            orders: Vec::new(),
            start_playing: true,
        }
    }
}

/// Cloneable handle for talking to a running [`SimulationService`]
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Command>,
}

impl GameHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| anyhow!("simulation service has stopped"))
    }

    async fn trade(&self, side: OrderSide, stock: &str, shares: &str) -> Result<Result<TradeReceipt, TradeError>> {
        let (reply, rx) = oneshot::channel();
        let (stock, shares) = (stock.to_string(), shares.to_string());
        let command = match side {
            OrderSide::Buy => Command::Buy { stock, shares, reply },
            OrderSide::Sell => Command::Sell { stock, shares, reply },
        };
        self.send(command).await?;
        rx.await.map_err(|_| anyhow!("simulation service dropped the trade"))
    }

    pub async fn buy(&self, stock: &str, shares: &str) -> Result<Result<TradeReceipt, TradeError>> {
        self.trade(OrderSide::Buy, stock, shares).await
    }

    pub async fn sell(&self, stock: &str, shares: &str) -> Result<Result<TradeReceipt, TradeError>> {
        self.trade(OrderSide::Sell, stock, shares).await
    }

    pub async fn play(&self) -> Result<()> {
        self.send(Command::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn step(&self) -> Result<Option<TurnReport>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Step { reply }).await?;
        rx.await.map_err(|_| anyhow!("simulation service dropped the step"))
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| anyhow!("simulation service dropped the snapshot"))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

/// Owns the game on a dedicated task.
///
/// Turns and commands are handled one at a time, so a turn is never
/// interleaved with a trade.
pub struct SimulationService {
    game: MarketGame,
    commands: mpsc::Receiver<Command>,
    settings: ServiceSettings,
    next_order: usize,
    turns_run: u64,
}

impl SimulationService {
    /// Start the service; the task resolves to the final snapshot.
    pub fn spawn(game: MarketGame, settings: ServiceSettings) -> (GameHandle, JoinHandle<GameSnapshot>) {
        let (tx, rx) = mpsc::channel(64);
        let mut service = Self {
            game,
            commands: rx,
            settings,
            next_order: 0,
            turns_run: 0,
        };
        if service.settings.start_playing {
            service.game.play();
        }
        let task = tokio::spawn(service.run());
        (GameHandle { tx }, task)
    }

    async fn run(mut self) -> GameSnapshot {
        let mut interval = time::interval(self.settings.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_ms = self.settings.tick.as_millis() as u64,
            max_turns = ?self.settings.max_turns,
            orders = self.settings.orders.len(),
            "Simulation service started"
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => {
                            info!("Simulation service shutting down");
                            break;
                        }
                        Some(command) => self.handle(command),
                    }
                }
                _ = interval.tick(), if self.game.is_playing() => {
                    self.run_due_orders();
                    if self.is_finished() {
                        info!(turns = self.turns_run, "Turn limit reached");
                        break;
                    }
                    if let Some(report) = self.game.tick() {
                        self.after_turn(&report);
                    }
                }
            }
        }

        self.game.snapshot()
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Buy { stock, shares, reply } => {
                let result = self.game.buy_text(&stock, &shares);
                let _ = reply.send(result);
            }
            Command::Sell { stock, shares, reply } => {
                let result = self.game.sell_text(&stock, &shares);
                let _ = reply.send(result);
            }
            Command::Play => {
                debug!("Play");
                self.game.play();
            }
            Command::Pause => {
                debug!("Pause");
                self.game.pause();
            }
            Command::Step { reply } => {
                if self.is_finished() {
                    let _ = reply.send(None);
                    return;
                }
                self.run_due_orders();
                let report = self.game.advance_turn(true);
                if let Some(report) = &report {
                    self.after_turn(report);
                }
                let _ = reply.send(report);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.game.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    /// Place every scripted order whose turn has come
    fn run_due_orders(&mut self) {
        let turn = self.game.turn();
        while let Some(order) = self.settings.orders.get(self.next_order) {
            if order.turn > turn {
                break;
            }
            let result = match order.side {
                OrderSide::Buy => self.game.buy_text(&order.stock, &order.shares),
                OrderSide::Sell => self.game.sell_text(&order.stock, &order.shares),
            };
            match result {
                Ok(receipt) => info!(turn, "{}", receipt.message()),
                Err(err) => warn!(turn, stock = %order.stock, "Scripted order rejected: {}", err),
            }
            self.next_order += 1;
        }
    }

    fn is_finished(&self) -> bool {
        self.settings
            .max_turns
            .is_some_and(|max| self.turns_run >= max)
    }

    fn after_turn(&mut self, report: &TurnReport) {
        self.turns_run += 1;
        for message in &report.messages {
            info!(turn = report.turn, "{}", message);
        }
    }
}
