//! # Service Configuration
//!
//! Read once at startup from `ZKVOTE_*` environment variables. Unset
//! variables take their defaults; set but unparseable ones are an error.
//!
//! | Variable | Default |
//! |---|---|
//! | `ZKVOTE_PORT` | 8080 |
//! | `ZKVOTE_ADMIN_TOKEN` | unset (admin routes answer 403) |
//! | `ZKVOTE_ATTEMPT_TIMEOUT_SECS` | 300 |
//! | `ZKVOTE_CALL_TIMEOUT_SECS` | 30 |
//! | `ZKVOTE_SWEEP_INTERVAL_SECS` | 60 |

use std::time::Duration;

use thiserror::Error;
use zkvote_orchestrator::OrchestratorConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("ZKVOTE_ADMIN_TOKEN must not be blank when set")]
    BlankAdminToken,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    /// Bearer token for ballot creation and voter revocation.
    pub admin_token: Option<String>,
    pub attempt_timeout_secs: i64,
    pub call_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("port", &self.port)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .field("attempt_timeout_secs", &self.attempt_timeout_secs)
            .field("call_timeout_secs", &self.call_timeout_secs)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_token: None,
            attempt_timeout_secs: 300,
            call_timeout_secs: 30,
            sweep_interval_secs: 60,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let admin_token = match lookup("ZKVOTE_ADMIN_TOKEN") {
            Some(t) if t.trim().is_empty() => return Err(ConfigError::BlankAdminToken),
            other => other,
        };

        Ok(Self {
            port: parse(&lookup, "ZKVOTE_PORT", "a port number", defaults.port)?,
            admin_token,
            attempt_timeout_secs: positive(
                parse(
                    &lookup,
                    "ZKVOTE_ATTEMPT_TIMEOUT_SECS",
                    "a positive number of seconds",
                    defaults.attempt_timeout_secs,
                )?,
                "ZKVOTE_ATTEMPT_TIMEOUT_SECS",
            )?,
            call_timeout_secs: positive(
                parse(
                    &lookup,
                    "ZKVOTE_CALL_TIMEOUT_SECS",
                    "a positive number of seconds",
                    defaults.call_timeout_secs,
                )?,
                "ZKVOTE_CALL_TIMEOUT_SECS",
            )?,
            sweep_interval_secs: positive(
                parse(
                    &lookup,
                    "ZKVOTE_SWEEP_INTERVAL_SECS",
                    "a positive number of seconds",
                    defaults.sweep_interval_secs,
                )?,
                "ZKVOTE_SWEEP_INTERVAL_SECS",
            )?,
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            attempt_timeout_secs: self.attempt_timeout_secs,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: raw,
        }),
    }
}

fn positive<T: Default + PartialOrd + ToString>(value: T, var: &'static str) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            expected: "a positive number of seconds",
            value: value.to_string(),
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let c = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c, ServiceConfig::default());
        assert_eq!(c.orchestrator(), OrchestratorConfig::default());
        assert_eq!(c.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn overrides_are_parsed() {
        let c = ServiceConfig::from_lookup(lookup(&[
            ("ZKVOTE_PORT", "9090"),
            ("ZKVOTE_ADMIN_TOKEN", "s3cret"),
            ("ZKVOTE_ATTEMPT_TIMEOUT_SECS", "120"),
            ("ZKVOTE_CALL_TIMEOUT_SECS", " 5 "),
            ("ZKVOTE_SWEEP_INTERVAL_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(c.port, 9090);
        assert_eq!(c.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(c.orchestrator().attempt_timeout_secs, 120);
        assert_eq!(c.orchestrator().call_timeout, Duration::from_secs(5));
        assert_eq!(c.sweep_interval(), Duration::from_secs(15));
    }

    #[test]
    fn bad_values_are_errors() {
        let err = ServiceConfig::from_lookup(lookup(&[("ZKVOTE_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ZKVOTE_PORT", .. }));
        let err = ServiceConfig::from_lookup(lookup(&[("ZKVOTE_CALL_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "ZKVOTE_CALL_TIMEOUT_SECS",
                ..
            }
        ));
        assert_eq!(
            ServiceConfig::from_lookup(lookup(&[("ZKVOTE_ADMIN_TOKEN", "  ")])).unwrap_err(),
            ConfigError::BlankAdminToken
        );
    }

    #[test]
    fn debug_redacts_admin_token() {
        let c = ServiceConfig {
            admin_token: Some("top-secret-token".to_string()),
            ..ServiceConfig::default()
        };
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("top-secret-token"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
