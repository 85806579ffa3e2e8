//! game-runner: play the stock market game without a UI.
//!
//! Usage:
//!   cargo run -p game-runner -- --turns 520 --seed 42
//!   cargo run -p game-runner -- --turns 200 --tick-ms 1 --order buy:Tech:10@1 --order sell:Tech:10@150
//!   cargo run -p game-runner -- --paused            # wait for Ctrl-C

use anyhow::{Context, Result};
use game_engine::{GameConfig, MarketGame};
use game_runner::{RunnerArgs, ServiceSettings, SimulationService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("game_runner=info,game_engine=info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = RunnerArgs::parse(&args)?;

    let mut config = GameConfig::from_env()?;
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    tracing::info!("Starting stock market game");
    tracing::info!("  Stocks: {}", config.stock_names.join(", "));
    tracing::info!("  Starting cash: ${:.2}", config.starting_cash);
    tracing::info!("  Tick: {}ms", args.tick.as_millis());
    if let Some(turns) = args.turns {
        tracing::info!("  Turns: {}", turns);
    }

    let game = MarketGame::new(config).context("failed to set up the market")?;
    let settings = ServiceSettings {
        tick: args.tick,
        max_turns: args.turns,
        orders: args.orders,
        start_playing: !args.paused,
    };
    let (handle, mut task) = SimulationService::spawn(game, settings);

    let snapshot = tokio::select! {
        finished = &mut task => finished.context("simulation task failed")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT");
            handle.shutdown().await.ok();
            task.await.context("simulation task failed")?
        }
    };

    tracing::info!(
        turn = snapshot.turn,
        cash = %snapshot.portfolio.cash,
        equity = %snapshot.portfolio.total_equity,
        "Game over"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
