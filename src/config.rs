use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::bluesky::client::{DEFAULT_CALL_TIMEOUT, DEFAULT_PUBLIC_API_URL};
use crate::pipeline::relationship::DEFAULT_RELATIONSHIP_CONCURRENCY;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Nothing
/// here is secret; every read goes through the public API.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public AT Protocol API endpoint (defaults to https://public.api.bsky.app).
    pub public_api_url: String,
    /// Upper bound for each HTTP attempt (RAFFLE_CALL_TIMEOUT_SECS).
    /// Rate-limit waits and 429 backoff are not counted.
    pub call_timeout: Duration,
    /// Relationship batches in flight at once (RAFFLE_RELATIONSHIP_CONCURRENCY).
    pub relationship_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables. Every value has a default.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let call_timeout = match lookup("RAFFLE_CALL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("RAFFLE_CALL_TIMEOUT_SECS is not a number: {raw:?}"))?;
                if secs == 0 {
                    anyhow::bail!("RAFFLE_CALL_TIMEOUT_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_CALL_TIMEOUT,
        };

        let relationship_concurrency = match lookup("RAFFLE_RELATIONSHIP_CONCURRENCY") {
            Some(raw) => {
                let n: usize = raw.trim().parse().with_context(|| {
                    format!("RAFFLE_RELATIONSHIP_CONCURRENCY is not a number: {raw:?}")
                })?;
                if n == 0 {
                    anyhow::bail!("RAFFLE_RELATIONSHIP_CONCURRENCY must be at least 1");
                }
                n
            }
            None => DEFAULT_RELATIONSHIP_CONCURRENCY,
        };

        Ok(Self {
            public_api_url: lookup("PUBLIC_API_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_API_URL.to_string()),
            call_timeout,
            relationship_concurrency,
        })
    }
}
