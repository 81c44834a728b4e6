//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0:4001` |
//! | `JWT_SECRET` | development secret (logged as a warning) |
//! | `TOKEN_TTL_SECS` | `86400` |
//! | `ADMIN_EMAIL` / `ADMIN_USERNAME` / `ADMIN_PASSWORD` | `admin@todolist.aos` / `admin` / `admin` |
//! | `DATABASE_URL` | unset (in-memory store) |
//! | `DB_CONNECT_RETRIES` | `5` |
//! | `DB_CONNECT_RETRY_DELAY_MS` | `5000` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4001";
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
/// Ten years.
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// The account created at startup when no user has its email yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            email: "admin@todolist.aos".into(),
            username: "admin".into(),
            password: "admin".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin: AdminSeed,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4001)),
            jwt_secret: DEV_JWT_SECRET.into(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            admin: AdminSeed::default(),
            database: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "BIND_ADDR",
                expected: "socket address",
                value: raw,
            })?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure development secret");
            DEV_JWT_SECRET.to_string()
        });

        let ttl_secs: u64 = parse_number(get("TOKEN_TTL_SECS"), "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if ttl_secs == 0 || ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_SECS",
                expected: "seconds between 1 and 315360000",
                value: ttl_secs.to_string(),
            });
        }

        let admin = AdminSeed {
            email: get("ADMIN_EMAIL").unwrap_or(defaults.admin.email),
            username: get("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
            password: get("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
        };

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                connect_retries: parse_number(get("DB_CONNECT_RETRIES"), "DB_CONNECT_RETRIES", 5)?,
                retry_delay: Duration::from_millis(parse_number(
                    get("DB_CONNECT_RETRY_DELAY_MS"),
                    "DB_CONNECT_RETRY_DELAY_MS",
                    5000,
                )?),
            }),
            None => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_secs),
            admin,
            database,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "number",
            value: raw,
        }),
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
    fn empty_environment_yields_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.database.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "60"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("DATABASE_URL", "postgres://localhost/todo"),
            ("DB_CONNECT_RETRIES", "2"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_ttl, Duration::from_secs(60));
        assert_eq!(cfg.admin.email, "root@example.com");
        assert_eq!(cfg.admin.username, "admin");

        let db = cfg.database.unwrap();
        assert_eq!(db.connect_retries, 2);
        assert_eq!(db.retry_delay, Duration::from_millis(5000));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")])).unwrap();
        assert!(cfg.database.is_none());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TOKEN_TTL_SECS", .. }));

        let err = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TOKEN_TTL_SECS", .. }));

        let err = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_SECS", "10000000000000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TOKEN_TTL_SECS", .. }));

        let max = MAX_TOKEN_TTL_SECS.to_string();
        let cfg = AppConfig::from_lookup(lookup(&[("TOKEN_TTL_SECS", max.as_str())])).unwrap();
        assert_eq!(cfg.token_ttl, Duration::from_secs(MAX_TOKEN_TTL_SECS));

        let err = AppConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDR"));
    }
}
