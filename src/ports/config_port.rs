//! Configuration access port trait.

use crate::domain::error::IndexError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent or blank; `ConfigInvalid` when the
    /// value is not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, IndexError> {
        match self.get_string(section, key) {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse::<i64>()
                .map_err(|_| IndexError::invalid(section, key, format!("'{}' is not an integer", value.trim()))),
            _ => Ok(default),
        }
    }

    /// Comma-separated value split into trimmed, non-empty items.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
