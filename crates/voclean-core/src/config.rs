//! Service configuration loaded from the environment.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::constants::{
    DEFAULT_POLL_FAILURE_WARN_THRESHOLD, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PROCESSOR_TIMEOUT_SECS,
};

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Address the HTTP server binds to, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Base URL of the external denoise API.
    pub denoise_api_url: String,
    /// API key for the denoise API.
    pub denoise_api_key: String,
    /// Publicly reachable base URL of this service, used to build the
    /// webhook callback address. Polling-only mode when unset.
    pub public_base_url: Option<String>,
    /// Interval between status polls for a cleaning recording.
    pub poll_interval: Duration,
    /// Consecutive poll failures before a warning is logged.
    pub poll_failure_warn_threshold: u32,
    /// Request timeout for denoise API calls.
    pub processor_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Best effort; deployments set real environment variables.
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let denoise_api_url =
            std::env::var("DENOISE_API_URL").context("DENOISE_API_URL must be set")?;
        let denoise_api_key =
            std::env::var("DENOISE_API_KEY").context("DENOISE_API_KEY must be set")?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL").ok();

        let poll_interval_secs = env_u64("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let poll_failure_warn_threshold = env_u64(
            "POLL_FAILURE_WARN_THRESHOLD",
            u64::from(DEFAULT_POLL_FAILURE_WARN_THRESHOLD),
        )? as u32;
        let processor_timeout_secs =
            env_u64("PROCESSOR_TIMEOUT_SECS", DEFAULT_PROCESSOR_TIMEOUT_SECS)?;

        Ok(Self {
            database_url,
            bind_addr,
            denoise_api_url,
            denoise_api_key,
            public_base_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_failure_warn_threshold,
            processor_timeout: Duration::from_secs(processor_timeout_secs),
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be a positive integer, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
