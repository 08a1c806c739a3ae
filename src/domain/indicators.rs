//! Named indicator columns over a stock frame, plus signal checking.
//!
//! Columns are registered by name (`sma_200`, `ema`, ...) and computed for
//! every symbol group of the frame. `refresh` recomputes all of them in place
//! after new rows were appended; `check_signals` re-derives the buy and sell
//! lists from scratch on every call.

use crate::domain::error::RobotError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::rule::{Comparison, SignalRule};
use crate::domain::stock_frame::StockFrame;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub buys: Vec<String>,
    pub sells: Vec<String>,
}

impl Signals {
    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Indicators {
    columns: Vec<(String, IndicatorType)>,
    values: HashMap<String, HashMap<String, IndicatorSeries>>,
    signal_rule: Option<SignalRule>,
}

impl Indicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simple moving average column and compute it.
    pub fn sma(&mut self, frame: &StockFrame, period: usize, column_name: &str) {
        self.add_column(frame, column_name, IndicatorType::Sma(period));
    }

    /// Add an exponential moving average column and compute it.
    pub fn ema(&mut self, frame: &StockFrame, period: usize, column_name: &str) {
        self.add_column(frame, column_name, IndicatorType::Ema(period));
    }

    fn add_column(&mut self, frame: &StockFrame, column_name: &str, indicator: IndicatorType) {
        match self.columns.iter_mut().find(|(name, _)| name == column_name) {
            Some(entry) => entry.1 = indicator,
            None => self.columns.push((column_name.to_string(), indicator)),
        }
        self.values
            .insert(column_name.to_string(), compute_column(frame, indicator));
        tracing::debug!(column = column_name, %indicator, "indicator column added");
    }

    /// Register the compare rule used by `check_signals`. Names are kept as
    /// given; an unknown name is reported when signals are checked.
    pub fn set_indicator_signal_compare(
        &mut self,
        indicator_1: &str,
        indicator_2: &str,
        condition_buy: Comparison,
        condition_sell: Comparison,
    ) {
        let rule = SignalRule {
            indicator_1: indicator_1.to_string(),
            indicator_2: indicator_2.to_string(),
            condition_buy,
            condition_sell,
        };
        for name in [indicator_1, indicator_2] {
            if !self.has_column(name) {
                tracing::warn!(
                    column = name,
                    "signal rule references a column that does not exist yet"
                );
            }
        }
        self.signal_rule = Some(rule);
    }

    pub fn signal_rule(&self) -> Option<&SignalRule> {
        self.signal_rule.as_ref()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column(&self, name: &str, symbol: &str) -> Option<&IndicatorSeries> {
        self.values.get(name).and_then(|by_symbol| by_symbol.get(symbol))
    }

    /// Recompute every column for every symbol in the frame.
    pub fn refresh(&mut self, frame: &StockFrame) {
        for (name, indicator) in &self.columns {
            self.values
                .insert(name.clone(), compute_column(frame, *indicator));
        }
    }

    /// Symbols whose newest row satisfies the buy / sell condition.
    ///
    /// A symbol whose columns are still in warm-up appears in neither list.
    pub fn check_signals(&self, frame: &StockFrame) -> Result<Signals, RobotError> {
        let rule = self.signal_rule.as_ref().ok_or(RobotError::NoSignalRule)?;
        let left_column = self.values.get(&rule.indicator_1).ok_or_else(|| {
            RobotError::UnknownColumn {
                column: rule.indicator_1.clone(),
            }
        })?;
        let right_column = self.values.get(&rule.indicator_2).ok_or_else(|| {
            RobotError::UnknownColumn {
                column: rule.indicator_2.clone(),
            }
        })?;

        let mut signals = Signals::default();
        for symbol in frame.symbols() {
            let left = left_column.get(symbol).and_then(IndicatorSeries::last_valid);
            let right = right_column.get(symbol).and_then(IndicatorSeries::last_valid);
            let (Some(left), Some(right)) = (left, right) else {
                continue;
            };
            if rule.is_buy(left, right) {
                signals.buys.push(symbol.to_string());
            }
            if rule.is_sell(left, right) {
                signals.sells.push(symbol.to_string());
            }
        }
        Ok(signals)
    }
}

fn compute_column(
    frame: &StockFrame,
    indicator: IndicatorType,
) -> HashMap<String, IndicatorSeries> {
    frame
        .symbol_groups()
        .map(|group| (group.symbol.clone(), indicator.calculate(&group.bars)))
        .collect()
}
