// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup (a `.env` file is
//! honoured by the binary). Empty values count as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWKS_URL` | Key set endpoint for token verification | Required |
//! | `AUTH_REQUIRED_ROLE` | Role required on privileged routes | `admin` |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `AUTH_LEEWAY_SECS` | Clock skew tolerance for `nbf`/`exp` | `60` |
//! | `AUTH_JWKS_TIMEOUT_SECS` | Key set fetch timeout | `5` |
//! | `AUTH_REQUEST_TIMEOUT_SECS` | Per-request verification bound | `10` |
//! | `AUTH_KEY_CACHE_TTL_SECS` | Resolved key lifetime | Never expires |
//! | `AUTH_JWKS_PROBE_INTERVAL_SECS` | Reuse window for health probes of the key set endpoint | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::jwks::{DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_INTERVAL};
use crate::auth::middleware::DEFAULT_REQUEST_TIMEOUT;
use crate::auth::roles::DEFAULT_REQUIRED_ROLE;
use crate::auth::verifier::{VerifierSettings, DEFAULT_LEEWAY_SECS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const REQUIRED_ROLE_ENV: &str = "AUTH_REQUIRED_ROLE";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const LEEWAY_ENV: &str = "AUTH_LEEWAY_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "AUTH_JWKS_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_ENV: &str = "AUTH_REQUEST_TIMEOUT_SECS";
pub const KEY_CACHE_TTL_ENV: &str = "AUTH_KEY_CACHE_TTL_SECS";
pub const PROBE_INTERVAL_ENV: &str = "AUTH_JWKS_PROBE_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub bind_addr: SocketAddr,
    pub jwks_url: Url,
    pub required_role: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
    pub jwks_timeout: Duration,
    pub request_timeout: Duration,
    pub key_cache_ttl: Option<Duration>,
    pub probe_interval: Duration,
    pub log_format: LogFormat,
}

impl GateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|err| ConfigError::invalid(PORT_ENV, err.to_string()))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::invalid(HOST_ENV, err.to_string()))?;

        let raw_url = get(JWKS_URL_ENV).ok_or(ConfigError::Missing(JWKS_URL_ENV))?;
        let jwks_url =
            Url::parse(&raw_url).map_err(|err| ConfigError::invalid(JWKS_URL_ENV, err.to_string()))?;
        if !matches!(jwks_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                JWKS_URL_ENV,
                format!("unsupported scheme '{}'", jwks_url.scheme()),
            ));
        }

        let seconds = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            get(var)
                .map(|raw| {
                    raw.parse::<u64>()
                        .map_err(|err| ConfigError::invalid(var, err.to_string()))
                })
                .transpose()
        };

        let log_format = get(LOG_FORMAT_ENV)
            .map(|raw| raw.parse::<LogFormat>())
            .transpose()
            .map_err(|reason| ConfigError::invalid(LOG_FORMAT_ENV, reason))?
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            jwks_url,
            required_role: get(REQUIRED_ROLE_ENV).unwrap_or_else(|| DEFAULT_REQUIRED_ROLE.to_string()),
            issuer: get(ISSUER_ENV),
            audience: get(AUDIENCE_ENV),
            leeway_secs: seconds(LEEWAY_ENV)?.unwrap_or(DEFAULT_LEEWAY_SECS),
            jwks_timeout: seconds(JWKS_TIMEOUT_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            request_timeout: seconds(REQUEST_TIMEOUT_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            key_cache_ttl: seconds(KEY_CACHE_TTL_ENV)?.map(Duration::from_secs),
            probe_interval: seconds(PROBE_INTERVAL_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PROBE_INTERVAL),
            log_format,
        })
    }

    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            leeway_secs: self.leeway_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GateConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_only_jwks_url() {
        let config = load(&[(JWKS_URL_ENV, "https://idp.example.com/.well-known/jwks.json")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.required_role, "admin");
        assert_eq!(config.issuer, None);
        assert_eq!(config.leeway_secs, 60);
        assert_eq!(config.jwks_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.key_cache_ttl, None);
        assert_eq!(config.probe_interval, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn jwks_url_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing(JWKS_URL_ENV));
        assert_eq!(
            load(&[(JWKS_URL_ENV, "  ")]).unwrap_err(),
            ConfigError::Missing(JWKS_URL_ENV)
        );
    }

    #[test]
    fn non_http_jwks_url_is_rejected() {
        let err = load(&[(JWKS_URL_ENV, "file:///etc/jwks.json")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == JWKS_URL_ENV));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWKS_URL_ENV, "http://localhost:9000/jwks"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "3000"),
            (REQUIRED_ROLE_ENV, "operator"),
            (ISSUER_ENV, "https://idp.example.com"),
            (AUDIENCE_ENV, "backend"),
            (LEEWAY_ENV, "0"),
            (KEY_CACHE_TTL_ENV, "900"),
            (PROBE_INTERVAL_ENV, "5"),
            (LOG_FORMAT_ENV, "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.required_role, "operator");
        assert_eq!(config.key_cache_ttl, Some(Duration::from_secs(900)));
        assert_eq!(config.probe_interval, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Json);

        let settings = config.verifier_settings();
        assert_eq!(settings.issuer.as_deref(), Some("https://idp.example.com"));
        assert_eq!(settings.audience.as_deref(), Some("backend"));
        assert_eq!(settings.leeway_secs, 0);
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = load(&[(JWKS_URL_ENV, "http://localhost/jwks"), (PORT_ENV, "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == PORT_ENV));

        let err = load(&[
            (JWKS_URL_ENV, "http://localhost/jwks"),
            (REQUEST_TIMEOUT_ENV, "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == REQUEST_TIMEOUT_ENV));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = load(&[(JWKS_URL_ENV, "http://localhost/jwks"), (LOG_FORMAT_ENV, "xml")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == LOG_FORMAT_ENV));
    }
}
