use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use quire_core::roles::DEFAULT_SECTION;

use crate::auth::jwt::JwtConfig;

/// Where the wiki keeps its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; state is lost on restart.
    Memory,
    Postgres { database_url: String },
}

/// Credentials for the account guaranteed to exist and hold `admin` at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub user_id: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub storage: StorageBackend,
    /// JSON snapshot imported at startup. The built-in seed is used when unset.
    pub seed_path: Option<PathBuf>,
    /// Section for new pages that name none (default: `general`).
    pub default_section: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Minimum password length for admin-created users (default: `8`).
    pub min_password_length: usize,
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ('{raw}'): {e}")),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `JWT_SECRET`               | required                |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | `60`                    |
    /// | `STORAGE_BACKEND`          | `memory` (`postgres`)   |
    /// | `DATABASE_URL`             | required for `postgres` |
    /// | `SEED_PATH`                | unset                   |
    /// | `DEFAULT_SECTION`          | `general`               |
    /// | `BOOTSTRAP_ADMIN_ID`       | `u1`                    |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset (no bootstrap)    |
    /// | `MIN_PASSWORD_LENGTH`      | `8`                     |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{o}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let jwt = JwtConfig::from_lookup(&lookup)?;

        let storage = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("memory") => StorageBackend::Memory,
            Some("postgres") => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .filter(|s| !s.is_empty())
                    .context("DATABASE_URL must be set when STORAGE_BACKEND=postgres")?,
            },
            Some(other) => bail!("STORAGE_BACKEND must be 'memory' or 'postgres', got '{other}'"),
        };

        let seed_path = lookup("SEED_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let default_section = lookup("DEFAULT_SECTION").unwrap_or_else(|| DEFAULT_SECTION.into());

        let bootstrap_admin = lookup("BOOTSTRAP_ADMIN_PASSWORD")
            .filter(|s| !s.is_empty())
            .map(|password| BootstrapAdmin {
                user_id: lookup("BOOTSTRAP_ADMIN_ID").unwrap_or_else(|| "u1".into()),
                password,
            });

        let min_password_length: usize = parse_or(&lookup, "MIN_PASSWORD_LENGTH", 8)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            storage,
            seed_path,
            default_section,
            bootstrap_admin,
            min_password_length,
        })
    }
}
