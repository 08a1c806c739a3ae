//! JSON order-template file writer.

use crate::domain::error::RobotError;
use crate::domain::trade::TradeRecord;
use crate::ports::order_store_port::OrderStorePort;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonOrderFile {
    path: PathBuf,
}

impl JsonOrderFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<TradeRecord>, RobotError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Four-space indented JSON.
pub fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>, RobotError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

impl OrderStorePort for JsonOrderFile {
    fn save(&self, records: &[TradeRecord]) -> Result<(), RobotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, to_indented_json(&records)?)?;
        tracing::info!(
            path = %self.path.display(),
            orders = records.len(),
            "order templates written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{AssetType, EnterOrExit, LongOrShort, OrderType, Trade};
    use tempfile::TempDir;

    fn records() -> Vec<TradeRecord> {
        let mut enter = Trade::new(
            "long_enter",
            EnterOrExit::Enter,
            LongOrShort::Long,
            OrderType::Market,
        );
        enter.instrument("FCEL", 1, AssetType::Equity);
        let mut exit = Trade::new(
            "long_exit",
            EnterOrExit::Exit,
            LongOrShort::Long,
            OrderType::Market,
        );
        exit.instrument("FCEL", 1, AssetType::Equity);
        vec![enter.to_record(), exit.to_record()]
    }

    #[test]
    fn save_writes_indented_array() {
        let dir = TempDir::new().unwrap();
        let store = JsonOrderFile::new(dir.path().join("orders").join("order_strategies.jsonc"));
        store.save(&records()).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("[\n    {\n        \"trade_id\": \"long_enter\""));
        assert_eq!(store.load().unwrap(), records());
    }

    #[test]
    fn save_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonOrderFile::new(dir.path().join("order_strategies.jsonc"));
        store.save(&records()).unwrap();
        store.save(&records()).unwrap();

        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let store = JsonOrderFile::new("/nonexistent/order_strategies.jsonc");
        assert!(matches!(store.load(), Err(RobotError::Io(_))));
    }
}
