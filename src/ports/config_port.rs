//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is missing or blank, `Err` when the value is
    /// not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;

    /// Same contract as [`ConfigPort::get_int`], for booleans.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;

    /// Trimmed value, or `None` when the key is missing or blank.
    fn get_non_empty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
