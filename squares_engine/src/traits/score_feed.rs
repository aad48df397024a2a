use sqp_common::GameSnapshot;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("The score feed is unavailable. {0}")]
    Unavailable(String),
    #[error("The score feed did not respond in time")]
    Timeout,
    #[error("The score feed returned a malformed payload. {0}")]
    MalformedPayload(String),
}

impl FeedError {
    /// Transient failures are retried with backoff. Malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FeedError::MalformedPayload(_))
    }
}

/// An upstream source of game state. Implementations should not retry internally; the poller owns the retry policy.
#[allow(async_fn_in_trait)]
pub trait ScoreFeed {
    async fn fetch_snapshot(&self, game_id: &str) -> Result<GameSnapshot, FeedError>;
}
