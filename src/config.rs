use crate::error::AppError;
use chrono::Duration;
use std::env;

/// Default lifetime of an access token, in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
/// Default size of the Postgres connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for the Postgres store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Settings consumed by the credential and token service.
#[derive(Clone)]
pub struct SecurityConfig {
    /// Symmetric secret used to sign access tokens. Never logged.
    pub secret_key: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl SecurityConfig {
    /// Builds settings with the default TTL and bcrypt cost.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Loads the configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Required: `DATABASE_URL`, `SECRET_KEY`. Optional: `DATABASE_MAX_CONNECTIONS`,
    /// `ACCESS_TOKEN_EXPIRE_MINUTES`, `BCRYPT_COST`.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let secret_key = required(&lookup, "SECRET_KEY")?;

        let max_connections = parsed(&lookup, "DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(AppError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        let ttl_minutes: i64 = parsed(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES")?
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        if ttl_minutes <= 0 {
            return Err(AppError::Configuration(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be positive".into(),
            ));
        }
        let token_ttl = Duration::try_minutes(ttl_minutes).ok_or_else(|| {
            AppError::Configuration("ACCESS_TOKEN_EXPIRE_MINUTES is too large".into())
        })?;

        let bcrypt_cost: u32 = parsed(&lookup, "BCRYPT_COST")?.unwrap_or(bcrypt::DEFAULT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AppError::Configuration(
                "BCRYPT_COST must be between 4 and 31".into(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            security: SecurityConfig {
                secret_key,
                token_ttl,
                bcrypt_cost,
            },
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Configuration(format!("{} must be set", key))),
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Configuration(format!("{} must be a number", key))),
        _ => Ok(None),
    }
}
