use anyhow::{Context, Result};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use crate::tmdb::TMDB_BASE;

pub const TOKEN_VAR: &str = "TMDB_READ_ACCESS_TOKEN";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CAST_DETAIL_LIMIT: usize = 10;

#[derive(Clone)]
pub struct Config {
    pub tmdb_token: String,
    pub tmdb_base_url: String,
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Duration,
    pub cast_detail_limit: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tmdb_token", &"<redacted>")
            .field("tmdb_base_url", &self.tmdb_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("cast_detail_limit", &self.cast_detail_limit)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!("All required environment variables are set");
        Ok(config)
    }

    /// Builds the config from any key/value source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_token = get(TOKEN_VAR)
            .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {}", TOKEN_VAR))?;
        let tmdb_base_url = get("TMDB_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;
        let timeout_secs = match get("TMDB_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| anyhow::anyhow!("TMDB_TIMEOUT_SECS must be a positive integer"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let cast_detail_limit = match get("CAST_DETAIL_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .context("CAST_DETAIL_LIMIT must be a non-negative integer")?,
            None => DEFAULT_CAST_DETAIL_LIMIT,
        };

        Ok(Self {
            tmdb_token,
            tmdb_base_url,
            bind_addr,
            upstream_timeout: Duration::from_secs(timeout_secs),
            cast_detail_limit,
        })
    }
}
