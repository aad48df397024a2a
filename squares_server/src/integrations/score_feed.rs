//! Connects the engine's [`ScoreFeed`] seam to the HTTP score feed client.
use log::*;
use score_feed_tools::{ScoreFeedApi, ScoreFeedConfig, ScoreFeedError};
use sqp_common::GameSnapshot;
use squares_engine::{FeedError, ScoreFeed};

#[derive(Debug, Clone)]
pub struct FeedClient {
    api: ScoreFeedApi,
}

impl FeedClient {
    pub fn new(config: ScoreFeedConfig) -> Result<Self, ScoreFeedError> {
        let api = ScoreFeedApi::new(config)?;
        Ok(Self { api })
    }
}

impl ScoreFeed for FeedClient {
    async fn fetch_snapshot(&self, game_id: &str) -> Result<GameSnapshot, FeedError> {
        self.api.fetch_snapshot(game_id).await.map_err(|e| {
            trace!("📡️ Feed request for game {game_id} failed. {e}");
            to_feed_error(e)
        })
    }
}

/// The poller retries everything except malformed payloads, so anything the feed said that we could not read counts
/// as malformed.
fn to_feed_error(e: ScoreFeedError) -> FeedError {
    match e {
        ScoreFeedError::Timeout => FeedError::Timeout,
        ScoreFeedError::MalformedPayload(e) => FeedError::MalformedPayload(e.to_string()),
        ScoreFeedError::JsonError(s) => FeedError::MalformedPayload(s),
        e => FeedError::Unavailable(e.to_string()),
    }
}
