//! Process configuration, read once at startup and passed down explicitly.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::domain::{ApiKey, PhoneNumber, SenderId, Username, ValidationError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TEST_RECIPIENT: &str = "+250798922640";
pub const DEFAULT_TEST_SENDER: &str = "AFRICASTKNG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("invalid value for {var}: {source}")]
    Validation {
        var: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Deployment environment. Only development responses carry diagnostic detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "test" => Self::Test,
            _ => Self::Production,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    pub fn exposes_diagnostics(self) -> bool {
        self == Self::Development
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub username: Username,
    pub api_key: ApiKey,
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    /// Overrides the vendor messaging endpoint.
    pub endpoint: Option<String>,
    pub test_recipient: PhoneNumber,
    pub test_sender: SenderId,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Credentials have no fallback: a missing `API_KEY` or `USERNAME` is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::Missing { var: "API_KEY" })?;
        let api_key = ApiKey::new(api_key).map_err(|source| ConfigError::Validation {
            var: "API_KEY",
            source,
        })?;

        let username = get("USERNAME").ok_or(ConfigError::Missing { var: "USERNAME" })?;
        let username = Username::new(username).map_err(|source| ConfigError::Validation {
            var: "USERNAME",
            source,
        })?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let host = match get("HOST") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "HOST",
                value: raw,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let environment = get("APP_ENV")
            .or_else(|| get("NODE_ENV"))
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        let test_recipient = PhoneNumber::new(
            get("TEST_SMS_TO").unwrap_or_else(|| DEFAULT_TEST_RECIPIENT.to_owned()),
        )
        .map_err(|source| ConfigError::Validation {
            var: "TEST_SMS_TO",
            source,
        })?;

        let test_sender = SenderId::new(
            get("TEST_SMS_FROM").unwrap_or_else(|| DEFAULT_TEST_SENDER.to_owned()),
        )
        .map_err(|source| ConfigError::Validation {
            var: "TEST_SMS_FROM",
            source,
        })?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self {
            username,
            api_key,
            host,
            port,
            environment,
            endpoint: get("AT_ENDPOINT"),
            test_recipient,
            test_sender,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config =
            Config::from_lookup(lookup(&[("API_KEY", "atsk_1234"), ("USERNAME", "acme")]))
                .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.test_recipient.as_str(), DEFAULT_TEST_RECIPIENT);
        assert_eq!(config.test_sender.as_str(), DEFAULT_TEST_SENDER);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn missing_credentials_fail_fast() {
        let err = Config::from_lookup(lookup(&[("USERNAME", "acme")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "API_KEY" }));

        let err = Config::from_lookup(lookup(&[("API_KEY", "k"), ("USERNAME", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "USERNAME" }));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("USERNAME", "acme"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn app_env_takes_precedence_over_node_env() {
        let config = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("USERNAME", "acme"),
            ("NODE_ENV", "production"),
            ("APP_ENV", "development"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.environment.exposes_diagnostics());

        let config = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("USERNAME", "acme"),
            ("NODE_ENV", "development"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn invalid_test_recipient_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("USERNAME", "acme"),
            ("TEST_SMS_TO", "0798922640"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation {
                var: "TEST_SMS_TO",
                ..
            }
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("USERNAME", "sandbox"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("AT_ENDPOINT", "http://localhost:9000/version1/messaging"),
            ("LOG_FORMAT", "json"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://localhost:9000/version1/messaging")
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
    }
}
