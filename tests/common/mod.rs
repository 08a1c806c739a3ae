#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
pub use robotrader::domain::ohlcv::PriceBar;
use robotrader::domain::error::RobotError;
use robotrader::domain::market::BarSpec;
use robotrader::domain::trade::{OrderPayload, OrderStatus};
use robotrader::ports::broker_port::BrokerPort;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Write;

/// Broker double: canned history, a queue of "latest" bars, and a log of
/// everything the robot asked for.
pub struct MockBroker {
    pub history: HashMap<String, Vec<PriceBar>>,
    pub latest: VecDeque<PriceBar>,
    pub history_requests: RefCell<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
    pub placed: Vec<(String, OrderPayload)>,
    pub statuses: HashMap<String, OrderStatus>,
    pub status_checks: RefCell<Vec<String>>,
    pub reject_orders: bool,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
            latest: VecDeque::new(),
            history_requests: RefCell::new(Vec::new()),
            placed: Vec::new(),
            statuses: HashMap::new(),
            status_checks: RefCell::new(Vec::new()),
            reject_orders: false,
        }
    }

    pub fn with_history(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_latest(mut self, bars: Vec<PriceBar>) -> Self {
        self.latest.extend(bars);
        self
    }

    pub fn with_status(mut self, order_id: &str, status: OrderStatus) -> Self {
        self.statuses.insert(order_id.to_string(), status);
        self
    }

    pub fn rejecting(mut self) -> Self {
        self.reject_orders = true;
        self
    }
}

impl BrokerPort for MockBroker {
    fn historical_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        self.history_requests
            .borrow_mut()
            .push((symbol.to_string(), start, end));
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }

    fn latest_bars(
        &mut self,
        symbols: &[String],
        _bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        match self.latest.pop_front() {
            Some(bar) => Ok(vec![bar]),
            None => Err(RobotError::NoData {
                symbol: symbols.first().cloned().unwrap_or_default(),
            }),
        }
    }

    fn place_order(&mut self, account: &str, order: &OrderPayload) -> Result<String, RobotError> {
        if self.reject_orders {
            return Err(RobotError::OrderRejected {
                symbol: order.order_leg_collection[0].instrument.symbol.clone(),
                reason: "insufficient buying power".into(),
            });
        }
        self.placed.push((account.to_string(), order.clone()));
        Ok(format!("ORDER-{}", self.placed.len()))
    }

    fn order_status(&self, _account: &str, order_id: &str) -> Result<OrderStatus, RobotError> {
        self.status_checks.borrow_mut().push(order_id.to_string());
        Ok(self
            .statuses
            .get(order_id)
            .cloned()
            .unwrap_or(OrderStatus::Filled))
    }
}

/// Monday 2024-03-04 at the given UTC time.
pub fn monday(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, second).unwrap()
}

pub fn make_bar(symbol: &str, timestamp: DateTime<Utc>, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        timestamp,
        open: close,
        high: close + 0.05,
        low: close - 0.05,
        close,
        volume: 10_000,
    }
}

/// `count` one-minute bars ending at `last`, closes starting at `first_close`
/// and moving by `step` per bar.
pub fn generate_bars(
    symbol: &str,
    last: DateTime<Utc>,
    count: usize,
    first_close: f64,
    step: f64,
) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let ts = last - Duration::minutes((count - 1 - i) as i64);
            make_bar(symbol, ts, first_close + step * i as f64)
        })
        .collect()
}

/// `count` one-minute bars starting the minute after `after`, continuing a
/// series whose previous close was `prev_close`.
pub fn following_bars(
    symbol: &str,
    after: DateTime<Utc>,
    count: usize,
    prev_close: f64,
    step: f64,
) -> Vec<PriceBar> {
    (1..=count)
        .map(|i| {
            make_bar(
                symbol,
                after + Duration::minutes(i as i64),
                prev_close + step * i as f64,
            )
        })
        .collect()
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const MAIN_INI: &str = r#"
[main]
CLIENT_ID = ABCDEFG123
REDIRECT_URI = https://localhost/callback
JSON_PATH = /tmp/robotrader-test-token.json
ACCOUNT_NUMBER = 123456789
"#;
