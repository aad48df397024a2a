use std::time::Duration;

use log::*;
use sqp_common::Secret;

const DEFAULT_FEED_URL: &str = "http://127.0.0.1:8370/v1";
const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ScoreFeedConfig {
    /// The base url of the feed, without a trailing slash. Games are fetched from `{base_url}/games/{game_id}`.
    pub base_url: String,
    /// Sent in the `X-Api-Key` header when non-empty.
    pub api_key: Secret<String>,
    /// Upper bound on a single request, connect time included.
    pub timeout: Duration,
}

impl Default for ScoreFeedConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_FEED_URL.to_string(), api_key: Secret::default(), timeout: DEFAULT_FEED_TIMEOUT }
    }
}

impl ScoreFeedConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), ..Default::default() }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SQP_FEED_URL").unwrap_or_else(|_| {
            warn!("📡️ SQP_FEED_URL not set, using (probably useless) default {DEFAULT_FEED_URL}");
            DEFAULT_FEED_URL.to_string()
        });
        let api_key = Secret::new(std::env::var("SQP_FEED_API_KEY").unwrap_or_else(|_| {
            info!("📡️ SQP_FEED_API_KEY not set. Feed requests will be unauthenticated.");
            String::default()
        }));
        let timeout = std::env::var("SQP_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("📡️ Invalid value for SQP_FEED_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FEED_TIMEOUT);
        Self { base_url: base_url.trim_end_matches('/').to_string(), api_key, timeout }
    }
}
