//! CSV replay broker.
//!
//! Serves bars from `<dir>/<SYMBOL>.csv` (columns `timestamp,open,high,low,
//! close,volume`, RFC 3339 timestamps). History requests return the rows in
//! range; each `latest_bars` call then hands out the next unseen row per
//! symbol. Orders are not supported: wrap this adapter in the paper broker.

use crate::domain::error::RobotError;
use crate::domain::market::BarSpec;
use crate::domain::ohlcv::PriceBar;
use crate::domain::trade::{OrderPayload, OrderStatus};
use crate::ports::broker_port::BrokerPort;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

pub struct CsvReplayBroker {
    base_path: PathBuf,
    /// Newest timestamp handed out per symbol.
    served: RefCell<HashMap<String, DateTime<Utc>>>,
}

impl CsvReplayBroker {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            served: RefCell::new(HashMap::new()),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, RobotError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| RobotError::Broker {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| RobotError::Broker {
                reason: format!("{}: row {}: {}", path.display(), line + 1, e),
            })?;
            bars.push(PriceBar {
                symbol: symbol.to_string(),
                timestamp: row.timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn mark_served(&self, symbol: &str, timestamp: DateTime<Utc>) {
        let mut served = self.served.borrow_mut();
        let entry = served.entry(symbol.to_string()).or_insert(timestamp);
        if *entry < timestamp {
            *entry = timestamp;
        }
    }
}

impl BrokerPort for CsvReplayBroker {
    fn historical_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        let bars: Vec<PriceBar> = self
            .read_bars(symbol)?
            .into_iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .collect();
        if let Some(last) = bars.last() {
            self.mark_served(symbol, last.timestamp);
        }
        Ok(bars)
    }

    fn latest_bars(
        &mut self,
        symbols: &[String],
        _bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        let mut latest = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let after = self.served.borrow().get(symbol).copied();
            let next = self
                .read_bars(symbol)?
                .into_iter()
                .find(|b| after.is_none_or(|ts| b.timestamp > ts))
                .ok_or_else(|| RobotError::NoData {
                    symbol: symbol.clone(),
                })?;
            self.mark_served(symbol, next.timestamp);
            latest.push(next);
        }
        Ok(latest)
    }

    fn place_order(&mut self, _account: &str, _order: &OrderPayload) -> Result<String, RobotError> {
        Err(RobotError::Broker {
            reason: "csv replay cannot route orders; enable paper trading".into(),
        })
    }

    fn order_status(&self, _account: &str, order_id: &str) -> Result<OrderStatus, RobotError> {
        Err(RobotError::Broker {
            reason: format!("csv replay has no order {order_id}"),
        })
    }
}
