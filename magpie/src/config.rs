//! Store configuration.
//!
//! A plain serde struct: the embedding host either constructs it directly
//! or deserializes it from its own settings layer. Every knob has a default
//! and `validate` runs once at store open.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

/// Capture and retention knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Change-detector polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Ceiling for text-family content, in bytes.
    pub max_content_bytes: usize,
    /// Ceiling for raw image payloads, in bytes.
    pub max_image_bytes: usize,
    /// Source applications (names or identifiers) never captured from.
    pub excluded_apps: Vec<String>,
    /// Hard cap on total entries. 0 disables the cap.
    pub max_entries: usize,
    /// Age threshold for non-favorite eviction, in days. 0 disables it.
    pub max_age_days: u32,
    /// Page cap for list-returning queries.
    pub page_size: usize,
    /// Seconds between retention sweeps inside the capture loop.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            max_content_bytes: 1_048_576,  // 1 MiB
            max_image_bytes: 20_971_520,   // 20 MiB
            excluded_apps: default_excluded_apps(),
            max_entries: 5_000,
            max_age_days: 30,
            page_size: 100,
            sweep_interval_secs: 3_600,
        }
    }
}

/// Password managers are excluded out of the box.
fn default_excluded_apps() -> Vec<String> {
    [
        "1Password",
        "Bitwarden",
        "LastPass",
        "KeePassXC",
        "Keychain Access",
        "Dashlane",
        "Enpass",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::validation("poll_interval_ms must be greater than 0"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::validation("page_size must be greater than 0"));
        }
        if self.max_content_bytes == 0 {
            return Err(ConfigError::validation("max_content_bytes must be greater than 0"));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::validation("max_image_bytes must be greater than 0"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::validation("sweep_interval_secs must be greater than 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Age threshold for the retention sweep; `None` when disabled.
    pub fn max_age(&self) -> Option<chrono::Duration> {
        if self.max_age_days == 0 {
            None
        } else {
            Some(chrono::Duration::days(i64::from(self.max_age_days)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll_interval_ms, 300);
        assert_eq!(config.max_content_bytes, 1_048_576);
        assert_eq!(config.max_image_bytes, 20_971_520);
        assert_eq!(config.max_entries, 5_000);
        assert_eq!(config.max_age_days, 30);
        assert_eq!(config.page_size, 100);
        assert!(config.excluded_apps.iter().any(|a| a == "1Password"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = Config {
            page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ceilings_rejected() {
        let config = Config {
            max_content_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_image_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_age_disabled_by_zero() {
        let config = Config {
            max_age_days: 0,
            ..Default::default()
        };
        assert_eq!(config.max_age(), None);

        let config = Config::default();
        assert_eq!(config.max_age(), Some(chrono::Duration::days(30)));
    }

    #[test]
    fn test_intervals() {
        let config = Config {
            poll_interval_ms: 150,
            sweep_interval_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(150));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"poll_interval_ms": 100}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.max_entries, 5_000);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config {
            excluded_apps: vec!["CustomVault".to_string()],
            max_entries: 250,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
