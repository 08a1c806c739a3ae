//! Portfolio: tracked instruments plus the price data attached to them.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::ohlcv::PriceBar;
use super::stock_frame::StockFrame;
use super::trade::AssetType;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub asset_type: AssetType,
    pub quantity: u32,
    pub purchase_price: f64,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    pub account_number: String,
    pub positions: BTreeMap<String, Position>,
    pub historical_prices: Vec<PriceBar>,
    pub stock_frame: Option<StockFrame>,
}

impl Portfolio {
    pub fn new(account_number: &str) -> Self {
        Portfolio {
            account_number: account_number.to_string(),
            ..Self::default()
        }
    }

    /// Track a symbol. Quantity 0 means "watched, not held".
    pub fn add_position(&mut self, symbol: &str, asset_type: AssetType) -> &Position {
        let symbol = symbol.to_uppercase();
        self.positions
            .entry(symbol.clone())
            .or_insert_with(|| Position {
                symbol,
                asset_type,
                quantity: 0,
                purchase_price: 0.0,
                purchase_date: None,
            })
    }

    pub fn in_portfolio(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new("123456789");
        assert_eq!(portfolio.account_number, "123456789");
        assert!(portfolio.positions.is_empty());
        assert!(portfolio.historical_prices.is_empty());
        assert!(portfolio.stock_frame.is_none());
    }

    #[test]
    fn add_and_look_up_position() {
        let mut portfolio = Portfolio::new("1");
        portfolio.add_position("fcel", AssetType::Equity);

        assert!(portfolio.in_portfolio("FCEL"));
        let pos = &portfolio.positions["FCEL"];
        assert_eq!(pos.quantity, 0);
        assert_eq!(pos.asset_type, AssetType::Equity);
    }

    #[test]
    fn add_position_twice_keeps_one() {
        let mut portfolio = Portfolio::new("1");
        portfolio.add_position("FCEL", AssetType::Equity);
        portfolio.add_position("FCEL", AssetType::Equity);
        assert_eq!(portfolio.positions.len(), 1);
        assert_eq!(portfolio.symbols(), vec!["FCEL".to_string()]);
    }
}
