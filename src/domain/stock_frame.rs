//! Price-series table keyed by (symbol, timestamp).
//!
//! Rows are grouped per symbol and kept in timestamp order. The frame is
//! append-only: `add_rows` inserts new keys and overwrites rows whose key is
//! already present (a still-forming bar can be reported twice), but never
//! removes a row.

use crate::domain::ohlcv::PriceBar;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct SymbolGroup {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub timestamp_index: HashMap<DateTime<Utc>, usize>,
}

impl SymbolGroup {
    fn new(symbol: String) -> Self {
        Self {
            symbol,
            bars: Vec::new(),
            timestamp_index: HashMap::new(),
        }
    }

    /// Returns true when the bar introduced a new key.
    fn upsert(&mut self, bar: PriceBar) -> bool {
        if let Some(&i) = self.timestamp_index.get(&bar.timestamp) {
            self.bars[i] = bar;
            return false;
        }

        let is_newest = self
            .bars
            .last()
            .is_none_or(|last| last.timestamp < bar.timestamp);

        if is_newest {
            self.timestamp_index.insert(bar.timestamp, self.bars.len());
            self.bars.push(bar);
        } else {
            let pos = self.bars.partition_point(|b| b.timestamp < bar.timestamp);
            self.bars.insert(pos, bar);
            self.rebuild_index();
        }
        true
    }

    fn rebuild_index(&mut self) {
        self.timestamp_index = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StockFrame {
    groups: BTreeMap<String, SymbolGroup>,
}

impl StockFrame {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        let mut frame = Self::default();
        frame.add_rows(bars);
        frame
    }

    /// Append bars to the frame. Returns the number of new rows.
    pub fn add_rows(&mut self, bars: Vec<PriceBar>) -> usize {
        let mut inserted = 0;
        for bar in bars {
            let group = self
                .groups
                .entry(bar.symbol.clone())
                .or_insert_with(|| SymbolGroup::new(bar.symbol.clone()));
            if group.upsert(bar) {
                inserted += 1;
            }
        }
        inserted
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn symbol_groups(&self) -> impl Iterator<Item = &SymbolGroup> {
        self.groups.values()
    }

    pub fn bars_for(&self, symbol: &str) -> &[PriceBar] {
        self.groups
            .get(symbol)
            .map(|g| g.bars.as_slice())
            .unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.groups.values().map(|g| g.bars.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Last `n` rows of every symbol group, in (symbol, timestamp) order.
    pub fn tail(&self, n: usize) -> Vec<&PriceBar> {
        self.groups
            .values()
            .flat_map(|g| {
                let start = g.bars.len().saturating_sub(n);
                g.bars[start..].iter()
            })
            .collect()
    }

    /// Most recent timestamp across all symbols.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.groups
            .values()
            .filter_map(|g| g.last().map(|b| b.timestamp))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn minute(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap() + Duration::minutes(i)
    }

    fn make_bar(symbol: &str, i: i64, close: f64) -> PriceBar {
        PriceBar {
            symbol: symbol.to_string(),
            timestamp: minute(i),
            open: close,
            high: close + 0.1,
            low: close - 0.1,
            close,
            volume: 100,
        }
    }

    #[test]
    fn new_groups_and_sorts_rows() {
        let frame = StockFrame::new(vec![
            make_bar("FCEL", 2, 1.2),
            make_bar("AAPL", 0, 180.0),
            make_bar("FCEL", 0, 1.0),
            make_bar("FCEL", 1, 1.1),
        ]);

        assert_eq!(frame.symbols().collect::<Vec<_>>(), vec!["AAPL", "FCEL"]);
        let closes: Vec<f64> = frame.bars_for("FCEL").iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 1.1, 1.2]);
        assert_eq!(frame.row_count(), 4);
    }

    #[test]
    fn add_rows_appends_new_keys() {
        let mut frame = StockFrame::new(vec![make_bar("FCEL", 0, 1.0)]);
        let inserted = frame.add_rows(vec![make_bar("FCEL", 1, 1.1)]);

        assert_eq!(inserted, 1);
        assert_eq!(frame.bars_for("FCEL").len(), 2);
        assert_eq!(frame.last_timestamp(), Some(minute(1)));
    }

    #[test]
    fn add_rows_overwrites_existing_key() {
        let mut frame = StockFrame::new(vec![make_bar("FCEL", 0, 1.0), make_bar("FCEL", 1, 1.1)]);
        let inserted = frame.add_rows(vec![make_bar("FCEL", 1, 1.5)]);

        assert_eq!(inserted, 0);
        assert_eq!(frame.bars_for("FCEL").len(), 2);
        assert_eq!(frame.bars_for("FCEL")[1].close, 1.5);
    }

    #[test]
    fn add_rows_inserts_late_bar_in_order() {
        let mut frame = StockFrame::new(vec![make_bar("FCEL", 0, 1.0), make_bar("FCEL", 2, 1.2)]);
        frame.add_rows(vec![make_bar("FCEL", 1, 1.1)]);

        let group = frame.symbol_groups().next().unwrap();
        let closes: Vec<f64> = group.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 1.1, 1.2]);
        assert_eq!(group.timestamp_index[&minute(2)], 2);
    }

    #[test]
    fn tail_takes_last_rows_per_symbol() {
        let frame = StockFrame::new(vec![
            make_bar("AAPL", 0, 180.0),
            make_bar("AAPL", 1, 181.0),
            make_bar("FCEL", 0, 1.0),
            make_bar("FCEL", 1, 1.1),
            make_bar("FCEL", 2, 1.2),
        ]);

        let tail: Vec<(&str, f64)> = frame
            .tail(1)
            .into_iter()
            .map(|b| (b.symbol.as_str(), b.close))
            .collect();
        assert_eq!(tail, vec![("AAPL", 181.0), ("FCEL", 1.2)]);
    }

    #[test]
    fn empty_frame() {
        let frame = StockFrame::default();
        assert!(frame.is_empty());
        assert!(frame.bars_for("FCEL").is_empty());
        assert_eq!(frame.last_timestamp(), None);
    }
}
