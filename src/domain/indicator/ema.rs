//! Exponential Moving Average indicator.
//!
//! Seeded with the SMA of the first n closes, then each point moves toward
//! the close by alpha = 2/(n+1). Valid from the same bar as SMA(n).

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let seed = calculate_sma(bars, period);
    let alpha = 2.0 / (period as f64 + 1.0);

    let mut prev: Option<f64> = None;
    let values = bars
        .iter()
        .zip(&seed.values)
        .map(|(bar, sma)| {
            let current = match prev {
                Some(p) => Some(p + alpha * (bar.close - p)),
                None => sma.valid.then_some(sma.value),
            };
            prev = current;
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: current.is_some(),
                value: current.unwrap_or(0.0),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
