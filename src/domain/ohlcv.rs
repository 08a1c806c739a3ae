//! OHLCV price bar representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> PriceBar {
        PriceBar {
            symbol: "FCEL".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap(),
            open: 1.00,
            high: 1.10,
            low: 0.90,
            close: 1.05,
            volume: 50_000,
        }
    }

    #[test]
    fn serializes_with_rfc3339_timestamp() {
        let json = serde_json::to_value(sample_bar()).unwrap();
        assert_eq!(json["symbol"], "FCEL");
        assert_eq!(json["timestamp"], "2024-01-15T14:30:00Z");
        assert_eq!(json["volume"], 50_000);
    }
}
