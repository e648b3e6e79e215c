use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::feed_client::DEFAULT_FEED_URL;
use crate::ingest::DEFAULT_SCHEDULE_INTERVAL;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub feed_url: String,
    pub feed_timeout: Duration,
    pub worker_pool_size: usize,
    pub worker_queue_capacity: usize,
    pub schedule_interval: Duration,
    pub base_currency: String,
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            feed_url: lookup("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            feed_timeout: Duration::from_secs(parse_or(&lookup, "FEED_TIMEOUT_SECS", 30)?),
            worker_pool_size: parse_or(&lookup, "WORKER_POOL_SIZE", 10)?,
            worker_queue_capacity: parse_or(&lookup, "WORKER_QUEUE_CAPACITY", 100)?,
            schedule_interval: Duration::from_secs(parse_or(
                &lookup,
                "SCHEDULE_INTERVAL_SECS",
                DEFAULT_SCHEDULE_INTERVAL.as_secs(),
            )?),
            base_currency: lookup("BASE_CURRENCY").unwrap_or_else(|| "RUB".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value {value:?} for {key}")),
        None => Ok(default),
    }
}
