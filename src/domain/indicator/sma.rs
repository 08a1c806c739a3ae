//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n, kept as a running window sum.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if i >= period {
            window_sum -= bars[i - period].close;
        }

        let valid = i + 1 >= period;
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: if valid { window_sum / period as f64 } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                symbol: "TEST".into(),
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn sma_window_values() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert_relative_eq!(series.values[2].value, 20.0);
        assert_relative_eq!(series.values[3].value, 30.0);
        assert_relative_eq!(series.values[4].value, 40.0);
    }

    #[test]
    fn sma_period_1_tracks_close() {
        let bars = make_bars(&[1.5, 2.5, 3.5]);
        let series = calculate_sma(&bars, 1);

        for (point, bar) in series.values.iter().zip(&bars) {
            assert!(point.valid);
            assert_relative_eq!(point.value, bar.close);
        }
    }

    #[test]
    fn sma_timestamps_align_with_bars() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let series = calculate_sma(&bars, 2);

        for (point, bar) in series.values.iter().zip(&bars) {
            assert_eq!(point.timestamp, bar.timestamp);
        }
    }

    #[test]
    fn sma_period_longer_than_data() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 200);

        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.last_valid(), None);
    }

    #[test]
    fn sma_empty_and_zero_period() {
        assert!(calculate_sma(&[], 3).values.is_empty());
        assert!(calculate_sma(&make_bars(&[1.0]), 0).values.is_empty());
        assert_eq!(calculate_sma(&[], 3).indicator_type, IndicatorType::Sma(3));
    }
}
