//! Database configuration.

use cairn_core::{Error, Result};

/// Configuration for a database instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database name, used in log output.
    pub name: String,
    /// Whether tables default to durable record storage.
    pub persistent: bool,
    /// Whether per-session row counts are tracked for multi-version reads.
    pub multi_version: bool,
}

impl DatabaseConfig {
    /// Creates a persistent, single-version configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persistent: true,
            multi_version: false,
        }
    }

    /// Creates a configuration for an in-memory database.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name).with_persistent(false)
    }

    /// Sets whether the database is persistent.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Enables or disables multi-version row counting.
    pub fn with_multi_version(mut self, multi_version: bool) -> Self {
        self.multi_version = multi_version;
        self
    }

    /// Applies settings from a `KEY=VALUE;KEY=VALUE` string, as found after the
    /// database name in a connection URL.
    ///
    /// Recognised keys are `PERSISTENT` and `MVCC`. Keys are case-insensitive,
    /// empty segments are ignored.
    pub fn with_settings(mut self, settings: &str) -> Result<Self> {
        for part in settings.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                Error::invalid_config(format!("expected KEY=VALUE, got {:?}", part))
            })?;
            let key = key.trim().to_ascii_uppercase();
            let value = parse_bool(&key, value.trim())?;
            match key.as_str() {
                "PERSISTENT" => self.persistent = value,
                "MVCC" => self.multi_version = value,
                _ => return Err(Error::invalid_config(format!("unknown setting {}", key))),
            }
        }
        Ok(self)
    }

    /// Parses a configuration from a `KEY=VALUE` settings string.
    pub fn from_settings(name: impl Into<String>, settings: &str) -> Result<Self> {
        Self::new(name).with_settings(settings)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("cairn")
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" | "ON" | "1" => Ok(true),
        "FALSE" | "OFF" | "0" => Ok(false),
        _ => Err(Error::invalid_config(format!(
            "{} expects a boolean, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert!(config.persistent);
        assert!(!config.multi_version);

        let mem = DatabaseConfig::in_memory("mem");
        assert!(!mem.persistent);
    }

    #[test]
    fn test_from_settings() {
        let config = DatabaseConfig::from_settings("test", "PERSISTENT=FALSE;mvcc=true").unwrap();
        assert!(!config.persistent);
        assert!(config.multi_version);
        assert_eq!(config.name, "test");

        let config = DatabaseConfig::from_settings("test", " ; MVCC = ON ;").unwrap();
        assert!(config.multi_version);
        assert!(config.persistent);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            DatabaseConfig::from_settings("t", "CACHE_SIZE=10"),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            DatabaseConfig::from_settings("t", "MVCC=maybe"),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            DatabaseConfig::from_settings("t", "MVCC"),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
