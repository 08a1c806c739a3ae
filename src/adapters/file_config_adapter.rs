//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        if self.get_non_empty(section, key).is_none() {
            return Ok(None);
        }
        self.config
            .getint(section, key)
            .map_err(|e| format!("expected an integer: {e}"))
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        if self.get_non_empty(section, key).is_none() {
            return Ok(None);
        }
        self.config
            .getboolcoerce(section, key)
            .map_err(|e| format!("expected a boolean: {e}"))
    }
}
