//! Polling loop run while the regular market session is open.
//!
//! Each iteration: fetch the latest bar, append it, refresh indicators,
//! check signals, step the ownership state, submit the fired trades, wait
//! for the next bar, then poll the status of the current order. Broker errors
//! end the run.

use crate::domain::error::RobotError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicators::{Indicators, Signals};
use crate::domain::market::{time_until_next_bar, BarSpec};
use crate::domain::robot::Robot;
use crate::domain::session::{SessionState, Transition};
use crate::domain::stock_frame::StockFrame;
use crate::ports::broker_port::BrokerPort;
use crate::ports::clock_port::Clock;

const TAIL_ROWS: usize = 5;

#[derive(Debug, Default)]
pub struct LoopReport {
    pub iterations: usize,
    pub transitions: Vec<Transition>,
}

pub fn run<B: BrokerPort, C: Clock>(
    robot: &mut Robot<B>,
    indicators: &mut Indicators,
    state: &mut SessionState,
    bar: BarSpec,
    clock: &C,
) -> Result<LoopReport, RobotError> {
    let mut report = LoopReport::default();

    while robot.regular_market_open(clock.now()) {
        let transitions = run_iteration(robot, indicators, state, bar, clock)?;
        report.iterations += 1;
        report.transitions.extend(transitions);
    }

    tracing::info!(
        iterations = report.iterations,
        trades = report.transitions.len(),
        "market closed, stopping"
    );
    Ok(report)
}

pub fn run_iteration<B: BrokerPort, C: Clock>(
    robot: &mut Robot<B>,
    indicators: &mut Indicators,
    state: &mut SessionState,
    bar: BarSpec,
    clock: &C,
) -> Result<Vec<Transition>, RobotError> {
    let latest = robot.get_latest_bar(bar)?;
    let frame = robot.stock_frame_mut();
    let added = frame.add_rows(latest);
    tracing::debug!(added, "latest bars appended");

    indicators.refresh(frame);
    for row in frame.tail(TAIL_ROWS) {
        tracing::debug!(
            symbol = %row.symbol,
            timestamp = %row.timestamp,
            open = row.open,
            high = row.high,
            low = row.low,
            close = row.close,
            volume = row.volume,
            "frame tail"
        );
    }

    log_indicator_values(indicators, frame);

    let signals = indicators.check_signals(frame)?;
    let last_bar = frame.last_timestamp();

    let mut fired = Vec::new();
    for symbol in state.tracked_symbols() {
        log_symbol_status(&symbol, state, &signals);
        for transition in state.step(&symbol, &signals) {
            robot.execute_trade(transition.trade_id())?;
            fired.push(transition);
        }
    }

    if let Some(last_bar) = last_bar {
        let wait = time_until_next_bar(last_bar, clock.now(), bar)?;
        tracing::debug!(wait_secs = wait.as_secs_f64(), "waiting for next bar");
        clock.sleep(wait);
    }

    if let Some(trade_id) = state.current_order().trade_id() {
        let pending = robot
            .trade(trade_id)
            .map(|t| t.order_id.is_some() && !t.status.is_terminal())?;
        if pending {
            robot.check_status(trade_id)?;
        }
    }

    Ok(fired)
}

fn log_symbol_status(symbol: &str, state: &SessionState, signals: &Signals) {
    tracing::info!(
        symbol,
        owned = state.is_owned(symbol),
        buys = ?signals.buys,
        sells = ?signals.sells,
        "signal check"
    );
}

fn log_indicator_values(indicators: &Indicators, frame: &StockFrame) {
    for symbol in frame.symbols() {
        for column in indicators.column_names() {
            let value = indicators
                .column(column, symbol)
                .and_then(IndicatorSeries::last_valid);
            tracing::debug!(symbol, column, value = ?value, "indicator");
        }
    }
}
