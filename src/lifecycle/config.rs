//! Runtime configuration.
//!
//! Read from environment variables, optionally seeded from a `.env` file.

use std::env;

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for one market instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    /// Capacity of the actor's request channel.
    pub channel_buffer: usize,
    /// First segment of every order number (`ORD-20240301-000001`).
    pub order_prefix: String,
    pub log_format: LogFormat,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 64,
            order_prefix: "ORD".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl MarketConfig {
    /// Loads `MARKET_CHANNEL_BUFFER`, `MARKET_ORDER_PREFIX` and
    /// `MARKET_LOG_FORMAT`, falling back to the defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`MarketConfig::from_env`] with an arbitrary source of values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let channel_buffer = match lookup("MARKET_CHANNEL_BUFFER") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MARKET_CHANNEL_BUFFER",
                        value: raw,
                    })
                }
            },
            None => defaults.channel_buffer,
        };

        let order_prefix = match lookup("MARKET_ORDER_PREFIX") {
            Some(raw) => {
                let prefix = raw.trim();
                if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(ConfigError::Invalid {
                        key: "MARKET_ORDER_PREFIX",
                        value: raw,
                    });
                }
                prefix.to_string()
            }
            None => defaults.order_prefix,
        };

        let log_format = match lookup("MARKET_LOG_FORMAT") {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "compact" => LogFormat::Compact,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MARKET_LOG_FORMAT",
                        value: raw,
                    })
                }
            },
            None => defaults.log_format,
        };

        Ok(Self {
            channel_buffer,
            order_prefix,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = MarketConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MarketConfig::default());
    }

    #[test]
    fn test_reads_every_key() {
        let config = MarketConfig::from_lookup(lookup(&[
            ("MARKET_CHANNEL_BUFFER", "8"),
            ("MARKET_ORDER_PREFIX", "CM"),
            ("MARKET_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.channel_buffer, 8);
        assert_eq!(config.order_prefix, "CM");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = MarketConfig::from_lookup(lookup(&[("MARKET_CHANNEL_BUFFER", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "MARKET_CHANNEL_BUFFER",
                value: "0".to_string()
            }
        );
        assert!(MarketConfig::from_lookup(lookup(&[("MARKET_ORDER_PREFIX", "O-R")])).is_err());
        assert!(MarketConfig::from_lookup(lookup(&[("MARKET_LOG_FORMAT", "pretty")])).is_err());
    }
}
