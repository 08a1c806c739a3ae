//! Per-symbol ownership state machine driven by buy/sell signal lists.
//!
//! States are {not held, held}. `Enter` fires when the symbol is not held and
//! is on the buy list; `Exit` fires when it is held and is on the sell list.
//! The buy branch is evaluated first and the sell branch then looks at the
//! updated flag, so a symbol on both lists enters and exits in one step.

use crate::domain::indicators::Signals;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentOrder {
    #[default]
    None,
    Enter(String),
    Exit(String),
}

impl CurrentOrder {
    pub fn trade_id(&self) -> Option<&str> {
        match self {
            CurrentOrder::None => None,
            CurrentOrder::Enter(id) | CurrentOrder::Exit(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Enter { symbol: String, trade_id: String },
    Exit { symbol: String, trade_id: String },
}

impl Transition {
    pub fn trade_id(&self) -> &str {
        match self {
            Transition::Enter { trade_id, .. } | Transition::Exit { trade_id, .. } => trade_id,
        }
    }
}

/// Trade ids fired on entry and exit for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradePair {
    pub buy: String,
    pub sell: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    ownership: HashMap<String, bool>,
    trades: HashMap<String, TradePair>,
    current_order: CurrentOrder,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `symbol` as not held, executing `trades` on its signals.
    pub fn track(&mut self, symbol: &str, trades: TradePair) {
        self.ownership.insert(symbol.to_string(), false);
        self.trades.insert(symbol.to_string(), trades);
    }

    pub fn is_owned(&self, symbol: &str) -> bool {
        self.ownership.get(symbol).copied().unwrap_or(false)
    }

    pub fn set_owned(&mut self, symbol: &str, owned: bool) {
        self.ownership.insert(symbol.to_string(), owned);
    }

    pub fn current_order(&self) -> &CurrentOrder {
        &self.current_order
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.trades.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Apply one iteration's signals to `symbol`.
    pub fn step(&mut self, symbol: &str, signals: &Signals) -> Vec<Transition> {
        let Some(pair) = self.trades.get(symbol).cloned() else {
            return Vec::new();
        };
        let mut transitions = Vec::new();

        if !self.is_owned(symbol) && signals.buys.iter().any(|s| s == symbol) {
            self.set_owned(symbol, true);
            self.current_order = CurrentOrder::Enter(pair.buy.clone());
            transitions.push(Transition::Enter {
                symbol: symbol.to_string(),
                trade_id: pair.buy.clone(),
            });
        }

        if self.is_owned(symbol) && signals.sells.iter().any(|s| s == symbol) {
            self.set_owned(symbol, false);
            self.current_order = CurrentOrder::Exit(pair.sell.clone());
            transitions.push(Transition::Exit {
                symbol: symbol.to_string(),
                trade_id: pair.sell,
            });
        }

        transitions
    }
}
