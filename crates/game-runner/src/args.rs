use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl FromStr for OrderSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => bail!("unknown order side {:?}, expected buy or sell", other),
        }
    }
}

/// A trade placed automatically when the game reaches `turn`.
///
/// Written as `side:stock:shares@turn`, e.g. `buy:Tech:10@5`. The share
/// count stays raw text and is validated by the game like typed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedOrder {
    pub side: OrderSide,
    pub stock: String,
    pub shares: String,
    pub turn: u64,
}

impl FromStr for ScriptedOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (trade, turn) = s
            .rsplit_once('@')
            .with_context(|| format!("order {:?} is missing @turn", s))?;
        let turn = turn
            .trim()
            .parse()
            .with_context(|| format!("order {:?} has an invalid turn", s))?;

        let parts: Vec<&str> = trade.split(':').collect();
        let [side, stock, shares] = parts.as_slice() else {
            bail!("order {:?} must look like side:stock:shares@turn", s);
        };

        Ok(Self {
            side: side.parse()?,
            stock: stock.trim().to_string(),
            shares: shares.trim().to_string(),
            turn,
        })
    }
}

/// Command-line options of the headless runner
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerArgs {
    /// Stop after this many turns; run until interrupted otherwise
    pub turns: Option<u64>,
    pub seed: Option<u64>,
    pub tick: Duration,
    pub orders: Vec<ScriptedOrder>,
    /// Start paused and wait for commands
    pub paused: bool,
}

impl Default for RunnerArgs {
    fn default() -> Self {
        Self {
            turns: None,
            seed: None,
            tick: Duration::from_millis(250),
            orders: Vec::new(),
            paused: false,
        }
    }
}

impl RunnerArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = Self::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--turns" => parsed.turns = Some(parse_value(arg, iter.next())?),
                "--seed" => parsed.seed = Some(parse_value(arg, iter.next())?),
                "--tick-ms" => {
                    let millis: u64 = parse_value(arg, iter.next())?;
                    parsed.tick = Duration::from_millis(millis.max(1));
                }
                "--order" => parsed.orders.push(parse_value(arg, iter.next())?),
                "--paused" => parsed.paused = true,
                other => bail!("unknown argument {:?}", other),
            }
        }

        parsed.orders.sort_by_key(|order| order.turn);
        Ok(parsed)
    }
}

fn parse_value<T>(flag: &str, value: Option<&String>) -> Result<T>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    let value = value.with_context(|| format!("{} needs a value", flag))?;
    value.parse::<T>().map_err(|err| {
        Into::<anyhow::Error>::into(err).context(format!("invalid value {:?} for {}", value, flag))
    })
}
