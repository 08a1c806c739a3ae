//! Settings read from the INI config.
//!
//! `[main]` carries the four broker credentials settings (required),
//! `[strategy]` and `[broker]` are optional and fall back to defaults.
//! A value that is present but does not parse is an error, never a default.
//!
//! `indicator_2` defaults to `sma_200`, the column the strategy adds. Names
//! are matched verbatim, so a config naming `sma200` fails at signal check.

use crate::domain::error::RobotError;
use crate::domain::market::{BarSpec, BarType};
use crate::domain::rule::Comparison;
use crate::domain::trade::AssetType;
use crate::ports::config_port::ConfigPort;
use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://api.tdameritrade.com/v1";
pub const DEFAULT_ORDERS_FILE: &str = "order_strategies.jsonc";
/// Upper bound for `history_days` and for the length of one bar.
pub const MAX_HISTORY_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub client_id: String,
    pub redirect_uri: String,
    pub credentials_path: PathBuf,
    pub account_number: String,
    pub paper_trading: bool,
    pub broker: BrokerSettings,
    pub strategy: StrategySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub symbol: String,
    pub asset_type: AssetType,
    pub quantity: u32,
    pub history_days: i64,
    pub bar: BarSpec,
    pub indicator_1: String,
    pub indicator_2: String,
    pub condition_buy: Comparison,
    pub condition_sell: Comparison,
    pub orders_file: PathBuf,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            symbol: "FCEL".to_string(),
            asset_type: AssetType::Equity,
            quantity: 1,
            history_days: 30,
            bar: BarSpec::minutes(1),
            indicator_1: "sma_50".to_string(),
            indicator_2: "sma_200".to_string(),
            condition_buy: Comparison::Ge,
            condition_sell: Comparison::Le,
            orders_file: PathBuf::from(DEFAULT_ORDERS_FILE),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RobotError> {
        Ok(Self {
            client_id: require(config, "main", "CLIENT_ID")?,
            redirect_uri: require(config, "main", "REDIRECT_URI")?,
            credentials_path: PathBuf::from(require(config, "main", "JSON_PATH")?),
            account_number: require(config, "main", "ACCOUNT_NUMBER")?,
            paper_trading: bool_or(config, "main", "PAPER_TRADING", true)?,
            broker: BrokerSettings::from_config(config)?,
            strategy: StrategySettings::from_config(config)?,
        })
    }
}

impl BrokerSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RobotError> {
        let base_url = config
            .get_non_empty("broker", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = int_or(config, "broker", "timeout_secs", 30)?;
        if timeout <= 0 {
            return Err(invalid("broker", "timeout_secs", "timeout_secs must be positive"));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout as u64,
        })
    }
}

impl StrategySettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RobotError> {
        let defaults = Self::default();

        let quantity = int_or(config, "strategy", "quantity", i64::from(defaults.quantity))?;
        if quantity <= 0 || quantity > i64::from(u32::MAX) {
            return Err(invalid("strategy", "quantity", "quantity must be a positive integer"));
        }
        let history_days = int_or(config, "strategy", "history_days", defaults.history_days)?;
        if history_days <= 0 || history_days > MAX_HISTORY_DAYS {
            return Err(invalid(
                "strategy",
                "history_days",
                &format!("history_days must be between 1 and {MAX_HISTORY_DAYS}"),
            ));
        }
        let bar_size = int_or(config, "strategy", "bar_size", i64::from(defaults.bar.size))?;
        if bar_size <= 0 || bar_size > i64::from(u32::MAX) {
            return Err(invalid("strategy", "bar_size", "bar_size must be positive"));
        }
        let bar = BarSpec {
            size: bar_size as u32,
            bar_type: parse_or::<BarType>(config, "strategy", "bar_type", defaults.bar.bar_type)?,
        };
        if bar.duration().is_none_or(|d| d > Duration::days(MAX_HISTORY_DAYS)) {
            return Err(invalid(
                "strategy",
                "bar_size",
                &format!("a {bar} bar is longer than {MAX_HISTORY_DAYS} days"),
            ));
        }

        Ok(Self {
            symbol: config
                .get_non_empty("strategy", "symbol")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.symbol),
            asset_type: parse_or(config, "strategy", "asset_type", defaults.asset_type)?,
            quantity: quantity as u32,
            history_days,
            bar,
            indicator_1: config
                .get_non_empty("strategy", "indicator_1")
                .unwrap_or(defaults.indicator_1),
            indicator_2: config
                .get_non_empty("strategy", "indicator_2")
                .unwrap_or(defaults.indicator_2),
            condition_buy: parse_or(config, "strategy", "condition_buy", defaults.condition_buy)?,
            condition_sell: parse_or(
                config,
                "strategy",
                "condition_sell",
                defaults.condition_sell,
            )?,
            orders_file: config
                .get_non_empty("strategy", "orders_file")
                .map(PathBuf::from)
                .unwrap_or(defaults.orders_file),
        })
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, RobotError> {
    config
        .get_non_empty(section, key)
        .ok_or_else(|| RobotError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn int_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, RobotError> {
    config
        .get_int(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|reason| invalid(section, key, &reason))
}

fn bool_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, RobotError> {
    config
        .get_bool(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|reason| invalid(section, key, &reason))
}

fn parse_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, RobotError>
where
    T: FromStr<Err = String>,
{
    match config.get_non_empty(section, key) {
        Some(raw) => raw.parse().map_err(|reason| RobotError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }),
        None => Ok(default),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> RobotError {
    RobotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
