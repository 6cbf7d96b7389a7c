//! Process configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use plantops_observability::LogFormat;

pub const BIND_ADDR_VAR: &str = "PLANTOPS_BIND_ADDR";
pub const LOG_FORMAT_VAR: &str = "PLANTOPS_LOG_FORMAT";
pub const SYSTEM_APPROVER_VAR: &str = "PLANTOPS_SYSTEM_APPROVER";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SYSTEM_APPROVER: &str = "System";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid socket address '{value}'")]
    BindAddr { var: &'static str, value: String },

    #[error("{var}: {source}")]
    LogFormat {
        var: &'static str,
        #[source]
        source: plantops_observability::ParseLogFormatError,
    },

    #[error("{var} must not be blank")]
    Blank { var: &'static str },
}

/// Runtime settings for the plant service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    /// Name stamped as approver on automatic stock transactions.
    pub system_approver: String,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::Json,
            system_approver: DEFAULT_SYSTEM_APPROVER.to_string(),
        }
    }
}

impl PlantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| ConfigError::BindAddr {
            var: BIND_ADDR_VAR,
            value: bind_raw.clone(),
        })?;

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse().map_err(|source| ConfigError::LogFormat {
                var: LOG_FORMAT_VAR,
                source,
            })?,
            None => LogFormat::default(),
        };

        let system_approver = match lookup(SYSTEM_APPROVER_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::Blank { var: SYSTEM_APPROVER_VAR });
            }
            Some(raw) => raw.trim().to_string(),
            None => DEFAULT_SYSTEM_APPROVER.to_string(),
        };

        Ok(Self {
            bind_addr,
            log_format,
            system_approver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<PlantConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlantConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(from(&[]).unwrap(), PlantConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = from(&[
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
            (LOG_FORMAT_VAR, "pretty"),
            (SYSTEM_APPROVER_VAR, "Plant bot"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.system_approver, "Plant bot");
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(from(&[(BIND_ADDR_VAR, "nowhere")]), Err(ConfigError::BindAddr { .. })));
        assert!(matches!(from(&[(LOG_FORMAT_VAR, "xml")]), Err(ConfigError::LogFormat { .. })));
        assert!(matches!(from(&[(SYSTEM_APPROVER_VAR, "  ")]), Err(ConfigError::Blank { .. })));
    }
}
