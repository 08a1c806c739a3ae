//! Bar sizing, regular-session hours and next-bar timing.

use crate::domain::error::RobotError;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use std::fmt;
use std::str::FromStr;

/// Slack added after a bar boundary so the broker has published the bar.
const NEXT_BAR_GRACE_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarType {
    Minute,
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for BarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(BarType::Minute),
            "daily" | "day" => Ok(BarType::Daily),
            "weekly" | "week" => Ok(BarType::Weekly),
            "monthly" | "month" => Ok(BarType::Monthly),
            other => Err(format!("unknown bar type '{other}'")),
        }
    }
}

impl fmt::Display for BarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarType::Minute => "minute",
            BarType::Daily => "daily",
            BarType::Weekly => "weekly",
            BarType::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarSpec {
    pub size: u32,
    pub bar_type: BarType,
}

impl BarSpec {
    pub fn minutes(size: u32) -> Self {
        Self {
            size,
            bar_type: BarType::Minute,
        }
    }

    /// Nominal length of one bar. Months count as 30 days. `None` when the
    /// length does not fit a `Duration`.
    pub fn duration(&self) -> Option<Duration> {
        let size = i64::from(self.size);
        match self.bar_type {
            BarType::Minute => Duration::try_minutes(size),
            BarType::Daily => Duration::try_days(size),
            BarType::Weekly => Duration::try_weeks(size),
            BarType::Monthly => size.checked_mul(30).and_then(Duration::try_days),
        }
    }
}

impl fmt::Display for BarSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.size, self.bar_type)
    }
}

/// Regular trading session, expressed in UTC. Holidays are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for MarketHours {
    /// 09:30-16:00 US/Eastern at standard-time offset.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(13, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
        }
    }
}

impl MarketHours {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = now.time();
        time >= self.open && time < self.close
    }
}

/// How long to wait from `now` until the bar after `last_bar` is available.
pub fn time_until_next_bar(
    last_bar: DateTime<Utc>,
    now: DateTime<Utc>,
    bar: BarSpec,
) -> Result<std::time::Duration, RobotError> {
    let next_bar = bar
        .duration()
        .and_then(|d| d.checked_add(&Duration::seconds(NEXT_BAR_GRACE_SECS)))
        .and_then(|d| last_bar.checked_add_signed(d))
        .ok_or_else(|| RobotError::BarOutOfRange {
            bar: bar.to_string(),
        })?;
    Ok((next_bar - now).to_std().unwrap_or(std::time::Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn open_during_weekday_session() {
        let hours = MarketHours::default();
        // 2024-03-04 is a Monday
        assert!(hours.is_open(at(2024, 3, 4, 13, 30, 0)));
        assert!(hours.is_open(at(2024, 3, 4, 19, 59, 59)));
    }

    #[test]
    fn closed_outside_session() {
        let hours = MarketHours::default();
        assert!(!hours.is_open(at(2024, 3, 4, 13, 29, 59)));
        assert!(!hours.is_open(at(2024, 3, 4, 20, 0, 0)));
    }

    #[test]
    fn closed_on_weekend() {
        let hours = MarketHours::default();
        assert!(!hours.is_open(at(2024, 3, 2, 15, 0, 0)));
        assert!(!hours.is_open(at(2024, 3, 3, 15, 0, 0)));
    }

    #[test]
    fn next_bar_wait_includes_grace() {
        let last = at(2024, 3, 4, 15, 0, 0);
        let now = at(2024, 3, 4, 15, 0, 20);
        let wait = time_until_next_bar(last, now, BarSpec::minutes(1)).unwrap();
        assert_eq!(wait, std::time::Duration::from_secs(45));
    }

    #[test]
    fn next_bar_wait_is_zero_when_late() {
        let last = at(2024, 3, 4, 15, 0, 0);
        let now = at(2024, 3, 4, 15, 5, 0);
        let wait = time_until_next_bar(last, now, BarSpec::minutes(1)).unwrap();
        assert_eq!(wait, std::time::Duration::ZERO);
    }

    #[test]
    fn bar_spec_duration() {
        assert_eq!(BarSpec::minutes(5).duration(), Some(Duration::minutes(5)));
        let daily = BarSpec {
            size: 1,
            bar_type: BarType::Daily,
        };
        assert_eq!(daily.duration(), Some(Duration::days(1)));
        assert_eq!(daily.to_string(), "1 daily");
    }

    #[test]
    fn bar_type_parse() {
        assert_eq!("minute".parse::<BarType>().unwrap(), BarType::Minute);
        assert_eq!("Day".parse::<BarType>().unwrap(), BarType::Daily);
        assert!("tick".parse::<BarType>().is_err());
    }

    #[test]
    fn oversized_bar_has_no_duration() {
        let bar = BarSpec {
            size: 4_000_000_000,
            bar_type: BarType::Monthly,
        };
        assert_eq!(bar.duration(), None);
    }

    #[test]
    fn next_bar_wait_errors_instead_of_overflowing() {
        let bar = BarSpec {
            size: 4_000_000_000,
            bar_type: BarType::Monthly,
        };
        let last = at(2024, 3, 4, 15, 0, 0);
        let err = time_until_next_bar(last, last, bar).unwrap_err();
        assert!(matches!(err, RobotError::BarOutOfRange { .. }));
    }
}
