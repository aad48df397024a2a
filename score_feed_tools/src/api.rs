use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqp_common::GameSnapshot;

use crate::{config::ScoreFeedConfig, data_objects::ScoreboardEvent, ScoreFeedError};

#[derive(Clone)]
pub struct ScoreFeedApi {
    config: ScoreFeedConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for ScoreFeedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScoreFeedApi ({})", self.config.base_url)
    }
}

impl ScoreFeedApi {
    pub fn new(config: ScoreFeedConfig) -> Result<Self, ScoreFeedError> {
        let mut headers = HeaderMap::with_capacity(2);
        if !config.api_key.is_empty() {
            let val = HeaderValue::from_str(config.api_key.reveal().as_str())
                .map_err(|e| ScoreFeedError::Initialization(e.to_string()))?;
            headers.insert("X-Api-Key", val);
        }
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoreFeedError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &ScoreFeedConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ScoreFeedError> {
        let url = self.url(path);
        trace!("📡️ Sending feed query: {url}");
        let response = self.client.request(method, url).send().await?;
        if response.status().is_success() {
            trace!("📡️ Feed query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ScoreFeedError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(ScoreFeedError::QueryError { status, message })
        }
    }

    /// Fetches the raw, unvalidated payload for the given game.
    pub async fn fetch_raw_game(&self, game_id: &str) -> Result<Value, ScoreFeedError> {
        let path = format!("/games/{game_id}");
        debug!("📡️ Fetching game {game_id}");
        self.rest_query::<Value>(Method::GET, &path).await
    }

    /// Fetches the game and validates it into a [`GameSnapshot`].
    pub async fn fetch_snapshot(&self, game_id: &str) -> Result<GameSnapshot, ScoreFeedError> {
        let raw = self.fetch_raw_game(game_id).await?;
        let snapshot = snapshot_from_payload(&raw)?;
        trace!("📡️ Game {game_id}: {snapshot:?}");
        Ok(snapshot)
    }
}

/// Converts any supported payload shape into a validated snapshot.
///
/// Payloads may be wrapped in a `game` or `event` envelope.
pub fn snapshot_from_payload(raw: &Value) -> Result<GameSnapshot, ScoreFeedError> {
    let body = raw.get("game").or_else(|| raw.get("event")).unwrap_or(raw);
    if ScoreboardEvent::is_scoreboard_shape(body) {
        let event = serde_json::from_value::<ScoreboardEvent>(body.clone())
            .map_err(|e| ScoreFeedError::JsonError(format!("Invalid scoreboard event. {e}")))?;
        Ok(GameSnapshot::from_json(&event.to_flat_json())?)
    } else {
        Ok(GameSnapshot::from_json(body)?)
    }
}
