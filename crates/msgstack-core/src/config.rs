//! Stack configuration.

use serde::Deserialize;
use thiserror::Error;

/// Default number of messages the store holds.
pub const DEFAULT_CAPACITY: usize = 10;

/// Default per-message buffer size, excluding the terminator.
pub const DEFAULT_MESSAGE_SIZE: usize = 20;

/// Default cursor bound enforced by producer writes.
pub const DEFAULT_WRITE_LIMIT: usize = 10;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Limits applied to the store and to session buffers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Maximum number of committed messages.
    pub capacity: usize,
    /// Size of each producer buffer, excluding the terminator.
    pub message_size: usize,
    /// Cursor bound for writes. Must not exceed `message_size`.
    pub write_limit: usize,
    /// Refuse producer opens while the store is full.
    ///
    /// Advisory only: a concurrent producer can still fill the store
    /// between open and close, and the commit-time push decides.
    pub reject_open_when_full: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            message_size: DEFAULT_MESSAGE_SIZE,
            write_limit: DEFAULT_WRITE_LIMIT,
            reject_open_when_full: false,
        }
    }
}

impl StackConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the limits are invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limits are usable together.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be non-zero".into()));
        }
        if self.message_size == 0 {
            return Err(ConfigError::Invalid("message_size must be non-zero".into()));
        }
        if self.write_limit == 0 {
            return Err(ConfigError::Invalid("write_limit must be non-zero".into()));
        }
        if self.write_limit > self.message_size {
            return Err(ConfigError::Invalid(format!(
                "write_limit {} exceeds message_size {}",
                self.write_limit, self.message_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StackConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.message_size, 20);
        assert_eq!(config.write_limit, 10);
        assert!(!config.reject_open_when_full);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = StackConfig::from_json(r#"{"capacity": 4}"#).unwrap();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.message_size, 20);
    }

    #[test]
    fn test_rejects_write_limit_past_buffer() {
        let err = StackConfig::from_json(r#"{"write_limit": 21}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = StackConfig::from_json(r#"{"depth": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
