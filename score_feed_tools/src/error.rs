use sqp_common::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreFeedError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The feed request could not be completed: {0}")]
    RequestError(String),
    #[error("The feed did not respond in time")]
    Timeout,
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("The feed payload was malformed. {0}")]
    MalformedPayload(#[from] SnapshotError),
}

impl ScoreFeedError {
    /// Whether the request is worth retrying. Malformed payloads are not: the feed answered, it just answered
    /// nonsense, and asking again within the same poll cycle will not fix that.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MalformedPayload(_) | Self::JsonError(_) | Self::Initialization(_))
    }
}

impl From<reqwest::Error> for ScoreFeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestError(e.to_string())
        }
    }
}
