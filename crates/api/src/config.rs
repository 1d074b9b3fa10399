//! Environment-driven configuration.
//!
//! Loading goes through a lookup function so tests can supply variables from
//! a map instead of mutating the process environment. Missing or malformed
//! values are reported as [`ConfigError`]; nothing here panics.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use crm_db::DbSettings;

use crate::auth::jwt::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedJwtSecret,
}

/// Read a required, non-empty variable.
pub(crate) fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

/// Read and parse an optional variable, falling back to `default`.
pub(crate) fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn string_or(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: &str) -> String {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Database settings shared by the server and the migrate/seed binaries.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub migrations_dir: PathBuf,
    pub seeds_dir: PathBuf,
}

impl DatabaseConfig {
    /// | Env Var                   | Default          |
    /// |---------------------------|------------------|
    /// | `DATABASE_URL`            | **required**     |
    /// | `DB_MAX_CONNECTIONS`      | `20`             |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`              |
    /// | `MIGRATIONS_DIR`          | `db/migrations`  |
    /// | `SEEDS_DIR`               | `db/seeds`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            acquire_timeout_secs: parsed(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            migrations_dir: string_or(&lookup, "MIGRATIONS_DIR", "db/migrations").into(),
            seeds_dir: string_or(&lookup, "SEEDS_DIR", "db/seeds").into(),
        })
    }

    pub fn pool_settings(&self) -> DbSettings {
        DbSettings {
            url: self.url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Apply pending migrations before serving.
    pub run_migrations: bool,
    /// Directory served under `/uploads`.
    pub uploads_dir: PathBuf,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                                       |
    /// |-------------------------|-----------------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                                     |
    /// | `PORT`                  | `3000`                                        |
    /// | `CORS_ORIGINS`          | `http://localhost:5173,http://localhost:5174` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                          |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                          |
    /// | `RUN_MIGRATIONS`        | `true`                                        |
    /// | `UPLOADS_DIR`           | `uploads`                                     |
    ///
    /// See [`DatabaseConfig`] and [`JwtConfig`] for the remaining variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cors_origins = string_or(
            &lookup,
            "CORS_ORIGINS",
            "http://localhost:5173,http://localhost:5174",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
        for origin in &cors_origins {
            if let Err(e) = HeaderValue::from_str(origin) {
                return Err(ConfigError::Invalid {
                    var: "CORS_ORIGINS",
                    value: origin.clone(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(Self {
            host: string_or(&lookup, "HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 3000)?,
            cors_origins,
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: parsed(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            run_migrations: parsed(&lookup, "RUN_MIGRATIONS", true)?,
            uploads_dir: string_or(&lookup, "UPLOADS_DIR", "uploads").into(),
            database: DatabaseConfig::from_lookup(&lookup)?,
            jwt: JwtConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/crm"),
        ("JWT_ACCESS_SECRET", "access-secret"),
        ("JWT_REFRESH_SECRET", "refresh-secret"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = ServerConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.cors_origins,
            ["http://localhost:5173", "http://localhost:5174"]
        );
        assert!(config.run_migrations);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(config.jwt.access_expiry_mins, 15);
        assert_eq!(config.jwt.refresh_expiry_days, 7);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert_matches!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn malformed_port_is_reported() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "PORT", .. });
    }

    #[test]
    fn cors_list_is_trimmed() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CORS_ORIGINS", " https://a.test , ,https://b.test"));
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.cors_origins, ["https://a.test", "https://b.test"]);
    }

    #[test]
    fn pool_settings_carry_timeouts() {
        let db = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "9"),
        ]))
        .unwrap();
        assert_eq!(db.pool_settings().acquire_timeout, Duration::from_secs(9));
    }
}
