//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::clock::{SimulatedClock, SystemClock};
use crate::adapters::csv_adapter::CsvReplayBroker;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::order_file_adapter::JsonOrderFile;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::td_broker_adapter::TdBroker;
use crate::domain::error::RobotError;
use crate::domain::market::MarketHours;
use crate::domain::robot::Robot;
use crate::domain::settings::Settings;
use crate::domain::strategy::{self, PreparedStrategy};
use crate::domain::strategy_loop::{self, LoopReport};
use crate::ports::broker_port::BrokerPort;
use crate::ports::clock_port::Clock;
use crate::ports::order_store_port::OrderStorePort;

#[derive(Parser, Debug)]
#[command(name = "robotrader", about = "Moving-average crossover trading robot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set up the strategy and trade while the market is open
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the order templates file
        #[arg(short, long)]
        orders: Option<PathBuf>,
        /// Replay bars from <DIR>/<SYMBOL>.csv instead of the broker API
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Simulated session start (RFC 3339); the clock only moves on sleep
        #[arg(long)]
        start: Option<DateTime<Utc>>,
    },
    /// Write the long_enter / long_exit order templates and exit
    Orders {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        orders: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            orders,
            replay,
            start,
        } => run_robot(&config, orders, replay, start).map(|report| {
            eprintln!(
                "Session finished: {} iterations, {} trades",
                report.iterations,
                report.transitions.len()
            );
        }),
        Command::Orders { config, orders } => write_orders(&config, orders).map(|path| {
            eprintln!("Order templates written to {}", path.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RobotError> {
    FileConfigAdapter::from_file(path).map_err(|e| RobotError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Settings from the config file, with the orders path overridden when given.
pub fn load_settings(path: &Path, orders: Option<PathBuf>) -> Result<Settings, RobotError> {
    tracing::info!(path = %path.display(), "loading config");
    let adapter = load_config(path)?;
    let mut settings = Settings::from_config(&adapter)?;
    if let Some(orders) = orders {
        settings.strategy.orders_file = orders;
    }
    Ok(settings)
}

fn run_robot(
    config_path: &Path,
    orders: Option<PathBuf>,
    replay: Option<PathBuf>,
    start: Option<DateTime<Utc>>,
) -> Result<LoopReport, RobotError> {
    let settings = load_settings(config_path, orders)?;
    let store = JsonOrderFile::new(&settings.strategy.orders_file);

    match (replay, start) {
        (Some(dir), Some(start)) => {
            if !settings.paper_trading {
                tracing::warn!("replay runs always paper trade");
            }
            let broker = PaperBroker::new(CsvReplayBroker::new(dir));
            let clock = SimulatedClock::new(start, chrono::Duration::seconds(1));
            run_session(broker, &settings, &store, &clock)
        }
        (Some(dir), None) => {
            let broker = PaperBroker::new(CsvReplayBroker::new(dir));
            run_session(broker, &settings, &store, &SystemClock)
        }
        (None, start) => {
            if start.is_some() {
                tracing::warn!("--start only applies to replay runs, ignoring");
            }
            let td = TdBroker::from_settings(&settings)?;
            if settings.paper_trading {
                tracing::info!("paper trading enabled, orders stay local");
                run_session(PaperBroker::new(td), &settings, &store, &SystemClock)
            } else {
                tracing::warn!(account = %settings.account_number, "live trading enabled");
                run_session(td, &settings, &store, &SystemClock)
            }
        }
    }
}

/// Setup followed by the polling loop, against any broker and clock.
pub fn run_session<B: BrokerPort, C: Clock>(
    broker: B,
    settings: &Settings,
    store: &dyn OrderStorePort,
    clock: &C,
) -> Result<LoopReport, RobotError> {
    let mut robot = Robot::new(broker, &settings.account_number, MarketHours::default());
    let PreparedStrategy {
        mut indicators,
        mut state,
    } = strategy::prepare(&mut robot, &settings.strategy, store, clock.now())?;

    strategy_loop::run(
        &mut robot,
        &mut indicators,
        &mut state,
        settings.strategy.bar,
        clock,
    )
}

fn write_orders(config_path: &Path, orders: Option<PathBuf>) -> Result<PathBuf, RobotError> {
    let settings = load_settings(config_path, orders)?;
    let store = JsonOrderFile::new(&settings.strategy.orders_file);
    let records: Vec<_> = strategy::order_templates(&settings.strategy)
        .iter()
        .map(|trade| trade.to_record())
        .collect();
    store.save(&records)?;
    Ok(store.path().to_path_buf())
}
