//! Moving-average crossover strategy setup.
//!
//! Builds everything the polling loop needs, in order: portfolio with the
//! traded symbol, historical bars, stock frame, the `sma_200`, `sma_50` and
//! `ema` columns, the compare rule, and the `long_enter` / `long_exit`
//! market-order templates.

use chrono::{DateTime, Duration, Utc};

use crate::domain::error::RobotError;
use crate::domain::indicators::Indicators;
use crate::domain::robot::Robot;
use crate::domain::session::{SessionState, TradePair};
use crate::domain::settings::StrategySettings;
use crate::domain::trade::{EnterOrExit, LongOrShort, OrderType, Trade, TradeRecord};
use crate::ports::broker_port::BrokerPort;
use crate::ports::order_store_port::OrderStorePort;

pub const LONG_ENTER: &str = "long_enter";
pub const LONG_EXIT: &str = "long_exit";

/// Everything produced by setup and consumed by the polling loop.
#[derive(Debug)]
pub struct PreparedStrategy {
    pub indicators: Indicators,
    pub state: SessionState,
}

/// The enter and exit market-order templates for `settings.symbol`.
pub fn order_templates(settings: &StrategySettings) -> Vec<Trade> {
    let mut enter = Trade::new(
        LONG_ENTER,
        EnterOrExit::Enter,
        LongOrShort::Long,
        OrderType::Market,
    );
    enter.instrument(&settings.symbol, settings.quantity, settings.asset_type);

    let mut exit = Trade::new(LONG_EXIT, EnterOrExit::Exit, LongOrShort::Long, OrderType::Market);
    exit.instrument(&settings.symbol, settings.quantity, settings.asset_type);

    vec![enter, exit]
}

/// Serialized enter and exit templates, enter first.
pub fn order_records<B: BrokerPort>(robot: &Robot<B>) -> Result<Vec<TradeRecord>, RobotError> {
    robot.trade_records(&[LONG_ENTER, LONG_EXIT])
}

/// Run the full setup and persist the order templates once.
pub fn prepare<B: BrokerPort>(
    robot: &mut Robot<B>,
    settings: &StrategySettings,
    store: &dyn OrderStorePort,
    now: DateTime<Utc>,
) -> Result<PreparedStrategy, RobotError> {
    robot
        .create_portfolio()
        .add_position(&settings.symbol, settings.asset_type);

    let start = Duration::try_days(settings.history_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| RobotError::ConfigInvalid {
            section: "strategy".into(),
            key: "history_days".into(),
            reason: format!("{} days reaches before the earliest date", settings.history_days),
        })?;
    robot.grab_historical_prices(start, now, settings.bar)?;
    let frame = robot.create_stock_frame();
    tracing::info!(rows = frame.row_count(), "stock frame created");

    let mut indicators = Indicators::new();
    indicators.sma(frame, 200, "sma_200");
    indicators.sma(frame, 50, "sma_50");
    indicators.ema(frame, 50, "ema");
    indicators.set_indicator_signal_compare(
        &settings.indicator_1,
        &settings.indicator_2,
        settings.condition_buy,
        settings.condition_sell,
    );
    if let Some(rule) = indicators.signal_rule() {
        tracing::info!(%rule, "signal rule set");
    }

    for trade in order_templates(settings) {
        robot.register_trade(trade);
    }
    let records = order_records(robot)?;
    store.save(&records)?;

    let mut state = SessionState::new();
    state.track(
        &settings.symbol,
        TradePair {
            buy: LONG_ENTER.to_string(),
            sell: LONG_EXIT.to_string(),
        },
    );

    Ok(PreparedStrategy { indicators, state })
}
