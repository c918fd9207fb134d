// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup and is
//! immutable afterwards. The authorization settings are handed to the
//! [`TokenAuthenticator`](crate::auth::TokenAuthenticator) at construction.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH0_DOMAIN` | Identity provider domain (issuer is `https://<domain>/`) | Required |
//! | `API_AUDIENCE` | Expected JWT audience claim | Required |
//! | `JWT_ALGORITHMS` | Comma-separated accepted algorithms | `RS256` |
//! | `JWKS_URL` | Override for the JWKS endpoint | `https://<domain>/.well-known/jwks.json` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache TTL, `0` refetches on every request | `300` |
//! | `JWKS_REFETCH_COOLDOWN_SECS` | Minimum cache age before an unknown `kid` refetches | `10` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | JWKS HTTP timeout | `10` |
//! | `JWKS_FETCH_RETRIES` | Extra attempts on transient JWKS failures | `1` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `SEED_SAMPLE_DATA` | Seed demo drinks and questions | `false` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve HTTPS with these PEM files | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

use crate::auth::jwks::{DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_REFETCH_COOLDOWN};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const JWT_ALGORITHMS_ENV: &str = "JWT_ALGORITHMS";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_REFETCH_COOLDOWN_ENV: &str = "JWKS_REFETCH_COOLDOWN_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWKS_FETCH_RETRIES_ENV: &str = "JWKS_FETCH_RETRIES";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const SEED_SAMPLE_DATA_ENV: &str = "SEED_SAMPLE_DATA";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter when the variable is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FETCH_RETRIES: u32 = 1;

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("unsupported JWT algorithm {0:?}; only RSA algorithms can be verified against a JWKS")]
    UnsupportedAlgorithm(String),
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Bearer token verification settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    /// Identity provider domain, without scheme or trailing slash
    pub domain: String,
    /// Expected `aud`
    pub audience: String,
    /// Accepted signature algorithms
    pub algorithms: Vec<Algorithm>,
    /// JWKS endpoint override
    pub jwks_url: Option<String>,
    pub jwks_cache_ttl: Duration,
    pub jwks_refetch_cooldown: Duration,
    pub jwks_fetch_timeout: Duration,
    pub jwks_fetch_retries: u32,
    /// Clock skew tolerance in seconds
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Settings for `domain` and `audience` with RS256 and default JWKS caching.
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            domain: normalize_domain(&domain.into()),
            audience: audience.into(),
            algorithms: vec![Algorithm::RS256],
            jwks_url: None,
            jwks_cache_ttl: DEFAULT_CACHE_TTL,
            jwks_refetch_cooldown: DEFAULT_REFETCH_COOLDOWN,
            jwks_fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            jwks_fetch_retries: DEFAULT_FETCH_RETRIES,
            leeway_secs: 0,
        }
    }

    /// Expected `iss`: `https://<domain>/`.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    /// The JWKS endpoint, defaulting to the provider's well-known location.
    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.domain))
    }
}

fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches("https://")
        .trim_end_matches('/')
        .to_string()
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// PEM files for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthConfig,
    pub seed_sample_data: bool,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, &host, e))?;

        let domain = get(AUTH0_DOMAIN_ENV).ok_or(ConfigError::Missing(AUTH0_DOMAIN_ENV))?;
        let audience = get(API_AUDIENCE_ENV).ok_or(ConfigError::Missing(API_AUDIENCE_ENV))?;
        let mut auth = AuthConfig::new(&domain, audience);
        Url::parse(&auth.issuer()).map_err(|e| ConfigError::invalid(AUTH0_DOMAIN_ENV, &domain, e))?;

        if let Some(list) = get(JWT_ALGORITHMS_ENV) {
            auth.algorithms = parse_algorithms(&list)?;
        }
        if let Some(url) = get(JWKS_URL_ENV) {
            validate_jwks_url(&url)?;
            auth.jwks_url = Some(url);
        }
        auth.jwks_cache_ttl = parse_secs(get(JWKS_CACHE_TTL_ENV), JWKS_CACHE_TTL_ENV, auth.jwks_cache_ttl)?;
        auth.jwks_refetch_cooldown = parse_secs(
            get(JWKS_REFETCH_COOLDOWN_ENV),
            JWKS_REFETCH_COOLDOWN_ENV,
            auth.jwks_refetch_cooldown,
        )?;
        auth.jwks_fetch_timeout =
            parse_secs(get(JWKS_FETCH_TIMEOUT_ENV), JWKS_FETCH_TIMEOUT_ENV, auth.jwks_fetch_timeout)?;
        auth.jwks_fetch_retries =
            parse_or(get(JWKS_FETCH_RETRIES_ENV), JWKS_FETCH_RETRIES_ENV, auth.jwks_fetch_retries)?;
        auth.leeway_secs = parse_or(get(JWT_LEEWAY_ENV), JWT_LEEWAY_ENV, auth.leeway_secs)?;

        let seed_sample_data = match get(SEED_SAMPLE_DATA_ENV) {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::invalid(SEED_SAMPLE_DATA_ENV, &value, "expected true or false")
            })?,
            None => false,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::default(),
            Some(format) if format == "json" => LogFormat::Json,
            Some(format) if format == "pretty" => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::invalid(LOG_FORMAT_ENV, &other, "expected json or pretty"))
            }
        };

        Ok(Self {
            bind_addr,
            auth,
            seed_sample_data,
            tls,
            log_format,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(name, &raw, e)),
        None => Ok(default),
    }
}

fn parse_secs(
    value: Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    parse_or(value, name, default.as_secs()).map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated algorithm list, accepting RSA algorithms only.
fn parse_algorithms(list: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let algorithm = Algorithm::from_str(name)
            .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;
        match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => {
                if !algorithms.contains(&algorithm) {
                    algorithms.push(algorithm);
                }
            }
            _ => return Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::invalid(JWT_ALGORITHMS_ENV, list, "no algorithms listed"));
    }
    Ok(algorithms)
}

/// The JWKS URL must be HTTPS; plain HTTP is accepted for exact loopback hosts.
fn validate_jwks_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid(JWKS_URL_ENV, raw, e))?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) => Ok(()),
        _ => Err(ConfigError::invalid(
            JWKS_URL_ENV,
            raw,
            "must use https (http only for localhost)",
        )),
    }
}
