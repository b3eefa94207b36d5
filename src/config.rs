use crate::connection::config::PoolConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub pool_max_sessions: usize,
    pub pool_acquire_timeout: Duration,
}

impl AppConfig {
    /// Reads `PK_*` variables, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("PK_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PK_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("PK_PORT must be a valid u16")?;

        let pool_max_sessions = lookup("PK_POOL_MAX_SESSIONS")
            .unwrap_or_else(|| "64".to_string())
            .parse::<usize>()
            .context("PK_POOL_MAX_SESSIONS must be a positive integer")?;

        let acquire_timeout_ms = lookup("PK_POOL_ACQUIRE_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .context("PK_POOL_ACQUIRE_TIMEOUT_MS must be a number of milliseconds")?;

        let config = Self {
            host,
            port,
            pool_max_sessions,
            pool_acquire_timeout: Duration::from_millis(acquire_timeout_ms),
        };

        config
            .pool_config()
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid pool settings")?;

        Ok(config)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_sessions(self.pool_max_sessions)
            .min_idle(self.pool_max_sessions.min(1))
            .acquire_timeout(self.pool_acquire_timeout)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
