//! Domain error types.

/// Top-level error type for robotrader.
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("broker request failed: {reason}")]
    Broker { reason: String },

    #[error("broker rejected order for {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("unknown indicator column '{column}'")]
    UnknownColumn { column: String },

    #[error("no trade registered under id '{trade_id}'")]
    UnknownTrade { trade_id: String },

    #[error("invalid trade {trade_id}: {reason}")]
    TradeInvalid { trade_id: String, reason: String },

    #[error("no signal rule configured")]
    NoSignalRule,

    #[error("bar length {bar} is out of range")]
    BarOutOfRange { bar: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RobotError {
    fn from(err: reqwest::Error) -> Self {
        RobotError::Broker {
            reason: err.to_string(),
        }
    }
}

impl From<&RobotError> for std::process::ExitCode {
    fn from(err: &RobotError) -> Self {
        let code: u8 = match err {
            RobotError::Io(_) | RobotError::Json(_) => 1,
            RobotError::ConfigParse { .. }
            | RobotError::ConfigMissing { .. }
            | RobotError::ConfigInvalid { .. } => 2,
            RobotError::Broker { .. } | RobotError::OrderRejected { .. } => 3,
            RobotError::UnknownColumn { .. }
            | RobotError::UnknownTrade { .. }
            | RobotError::TradeInvalid { .. }
            | RobotError::NoSignalRule
            | RobotError::BarOutOfRange { .. } => 4,
            RobotError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn config_missing_message() {
        let err = RobotError::ConfigMissing {
            section: "main".into(),
            key: "CLIENT_ID".into(),
        };
        assert_eq!(err.to_string(), "missing config key [main] CLIENT_ID");
    }

    #[test]
    fn unknown_column_message() {
        let err = RobotError::UnknownColumn {
            column: "sma200".into(),
        };
        assert_eq!(err.to_string(), "unknown indicator column 'sma200'");
    }

    #[test]
    fn exit_codes_by_category() {
        let config = RobotError::ConfigMissing {
            section: "main".into(),
            key: "JSON_PATH".into(),
        };
        let broker = RobotError::Broker {
            reason: "timeout".into(),
        };
        let no_data = RobotError::NoData {
            symbol: "FCEL".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));
        assert_eq!(ExitCode::from(&broker), ExitCode::from(3));
        assert_eq!(ExitCode::from(&no_data), ExitCode::from(5));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RobotError = io.into();
        assert!(matches!(err, RobotError::Io(_)));
        assert_eq!(ExitCode::from(&err), ExitCode::from(1));
    }
}
