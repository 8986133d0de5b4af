// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup into an
//! immutable [`Config`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the database file | `./data` |
//! | `UPLOAD_DIR` | Directory for uploaded post images | `./uploads` |
//! | `JWT_SECRET` | HS256 signing secret (at least 16 bytes) | Required |
//! | `JWT_TTL_SECS` | Session token lifetime, at most 30 days | `18000` (5 h) |
//! | `SESSION_CACHE_TTL_SECS` | Lifetime of a cached user | `60` |
//! | `CACHE_TIMEOUT_MS` | Upper bound on one cache call | `250` |
//! | `CACHE_CAPACITY` | Entries kept by the in-process cache | `10000` |
//! | `REDIS_URL` | Redis cache URL (`redis` feature) | Unset (in-process cache) |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::codec::{DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};
use crate::auth::SigningSecret;
use crate::cache::memory::DEFAULT_CAPACITY;
use crate::cache::session::{DEFAULT_CACHE_TIMEOUT, DEFAULT_SESSION_TTL};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_SECS";
pub const SESSION_CACHE_TTL_ENV: &str = "SESSION_CACHE_TTL_SECS";
pub const CACHE_TIMEOUT_ENV: &str = "CACHE_TIMEOUT_MS";
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const REDIS_URL_ENV: &str = "REDIS_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Name of the database file inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "social.redb";

/// Shortest accepted signing secret.
pub const MIN_SECRET_LEN: usize = 16;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{JWT_SECRET_ENV} must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: SigningSecret,
    pub token_ttl: Duration,
    pub session_cache_ttl: Duration,
    pub cache_timeout: Duration,
    pub cache_capacity: usize,
    pub redis_url: Option<String>,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                })?;

        let secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort);
        }

        let token_ttl = secs_or(&get, JWT_TTL_ENV, DEFAULT_TOKEN_TTL)?;
        if token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::Invalid {
                name: JWT_TTL_ENV,
                value: token_ttl.as_secs().to_string(),
            });
        }
        let session_cache_ttl = secs_or(&get, SESSION_CACHE_TTL_ENV, DEFAULT_SESSION_TTL)?;
        let request_timeout = secs_or(&get, REQUEST_TIMEOUT_ENV, DEFAULT_REQUEST_TIMEOUT)?;
        let cache_timeout = Duration::from_millis(parse_or(
            &get,
            CACHE_TIMEOUT_ENV,
            DEFAULT_CACHE_TIMEOUT.as_millis() as u64,
        )?);
        let cache_capacity = parse_or(&get, CACHE_CAPACITY_ENV, DEFAULT_CAPACITY)?;

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            upload_dir: PathBuf::from(
                get(UPLOAD_DIR_ENV).unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()),
            ),
            jwt_secret: SigningSecret::new(secret),
            token_ttl,
            session_cache_ttl,
            cache_timeout,
            cache_capacity,
            redis_url: get(REDIS_URL_ENV),
            request_timeout,
            log_format,
        })
    }

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_or<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Positive number of seconds.
fn secs_or<G>(get: &G, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(get, name, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef-test";

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_secret() {
        let cfg = config(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.token_ttl, Duration::from_secs(5 * 3600));
        assert_eq!(cfg.session_cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.cache_timeout, Duration::from_millis(250));
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.redis_url.is_none());
        assert_eq!(cfg.database_path(), PathBuf::from("./data/social.redb"));
    }

    #[test]
    fn secret_is_required_and_bounded() {
        assert_eq!(
            config(&[]).unwrap_err(),
            ConfigError::Missing(JWT_SECRET_ENV)
        );
        assert_eq!(
            config(&[(JWT_SECRET_ENV, "short")]).unwrap_err(),
            ConfigError::SecretTooShort
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            (JWT_SECRET_ENV, SECRET),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "3000"),
            (JWT_TTL_ENV, "3600"),
            (SESSION_CACHE_TTL_ENV, "5"),
            (CACHE_TIMEOUT_ENV, "50"),
            (REDIS_URL_ENV, "redis://cache:6379"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(cfg.token_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.session_cache_ttl, Duration::from_secs(5));
        assert_eq!(cfg.cache_timeout, Duration::from_millis(50));
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn token_ttl_is_bounded() {
        let too_long = (MAX_TOKEN_TTL.as_secs() + 1).to_string();
        assert_eq!(
            config(&[(JWT_SECRET_ENV, SECRET), (JWT_TTL_ENV, too_long.as_str())]).unwrap_err(),
            ConfigError::Invalid {
                name: JWT_TTL_ENV,
                value: too_long.clone(),
            }
        );
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, SECRET), (JWT_TTL_ENV, "0")]),
            Err(ConfigError::Invalid { name: JWT_TTL_ENV, .. })
        ));

        let max = MAX_TOKEN_TTL.as_secs().to_string();
        let cfg = config(&[(JWT_SECRET_ENV, SECRET), (JWT_TTL_ENV, max.as_str())]).unwrap();
        assert_eq!(cfg.token_ttl, MAX_TOKEN_TTL);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, SECRET), (PORT_ENV, "eighty")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, SECRET), (JWT_TTL_ENV, "0")]),
            Err(ConfigError::Invalid { name: JWT_TTL_ENV, .. })
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, SECRET), (LOG_FORMAT_ENV, "xml")]),
            Err(ConfigError::Invalid { name: LOG_FORMAT_ENV, .. })
        ));
    }
}
