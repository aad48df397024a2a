//! The score feed poller.
//!
//! Each pool with an external game id gets its own [`PoolPoller`]. A poller fetches one snapshot per cycle and hands
//! it to the settlement pipeline, so a pool's snapshots are always processed one at a time. Transient feed failures
//! are retried with exponential backoff inside the cycle. When a cycle runs out of attempts the pool is marked
//! degraded, and the stored scores are left exactly as they were.
use std::time::Duration;

use log::*;
use sqp_common::{GameSnapshot, GameStatus};

use crate::{
    sqp_api::{
        errors::SettlementError,
        settlement_api::{SettlementApi, SnapshotOutcome},
    },
    traits::{FeedError, PoolDatabase, ScoreFeed},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between polls while the game is in progress.
    pub live_interval: Duration,
    /// Time between polls before kickoff.
    pub pre_game_interval: Duration,
    /// Upper bound on a single feed request.
    pub feed_timeout: Duration,
    /// Fetch attempts per poll cycle.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_secs(15),
            pre_game_interval: Duration::from_secs(60),
            feed_timeout: Duration::from_secs(10),
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl PollerConfig {
    pub fn interval_for(&self, status: GameStatus) -> Duration {
        match status {
            GameStatus::Pre => self.pre_game_interval,
            _ => self.live_interval,
        }
    }
}

/// Doubling delays, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial.min(max), max }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}

/// The result of one fetch, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Snapshot(GameSnapshot),
    Malformed(String),
    Exhausted { attempts: u32, last_error: FeedError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Keep polling. Carries the game status, which sets the next interval.
    Continue(GameStatus),
    /// The pool no longer needs a poller.
    Finished(String),
}

pub struct PoolPoller<B, F> {
    pool_id: i64,
    api: SettlementApi<B>,
    feed: F,
    config: PollerConfig,
    malformed_streak: bool,
}

impl<B, F> PoolPoller<B, F>
where
    B: PoolDatabase,
    F: ScoreFeed,
{
    pub fn new(pool_id: i64, api: SettlementApi<B>, feed: F, config: PollerConfig) -> Self {
        Self { pool_id, api, feed, config, malformed_streak: false }
    }

    pub fn pool_id(&self) -> i64 {
        self.pool_id
    }

    /// Fetches a snapshot, retrying transient failures. Malformed payloads are not retried.
    pub async fn fetch_with_retry(&self, game_id: &str) -> FetchOutcome {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = FeedError::Timeout;
        for attempt in 1..=max_attempts {
            let result = tokio::time::timeout(self.config.feed_timeout, self.feed.fetch_snapshot(game_id)).await;
            match result {
                Ok(Ok(snapshot)) => return FetchOutcome::Snapshot(snapshot),
                Ok(Err(FeedError::MalformedPayload(reason))) => return FetchOutcome::Malformed(reason),
                Ok(Err(e)) => last_error = e,
                Err(_) => last_error = FeedError::Timeout,
            }
            warn!(
                "📡️ Feed fetch for pool #{} (game {game_id}) failed on attempt {attempt}/{max_attempts}. {last_error}",
                self.pool_id
            );
            if attempt < max_attempts {
                tokio::time::sleep(backoff.next_delay()).await;
            }
        }
        FetchOutcome::Exhausted { attempts: max_attempts, last_error }
    }

    /// Runs one poll cycle: fetch, record feed health, and settle the snapshot.
    pub async fn poll_cycle(&mut self) -> Result<PollStatus, SettlementError> {
        let pool_id = self.pool_id;
        let Some(pool) = self.api.db().fetch_pool(pool_id).await? else {
            return Ok(PollStatus::Finished("the pool was deleted".into()));
        };
        if pool.suspended {
            return Ok(PollStatus::Finished("the pool is suspended".into()));
        }
        if pool.game_status == GameStatus::Post {
            return Ok(PollStatus::Finished("the game is over".into()));
        }
        let Some(game_id) = pool.external_game_id.clone().filter(|id| !id.trim().is_empty()) else {
            return Ok(PollStatus::Finished("the pool has no external game id".into()));
        };
        match self.fetch_with_retry(&game_id).await {
            FetchOutcome::Snapshot(snapshot) => {
                self.malformed_streak = false;
                self.api.record_feed_recovered(pool_id).await?;
                self.settle(snapshot).await
            },
            FetchOutcome::Malformed(reason) => {
                warn!("📡️ Malformed payload for pool #{pool_id} (game {game_id}). {reason}");
                if !self.malformed_streak {
                    self.api.record_malformed_payload(pool_id, &reason).await?;
                }
                self.malformed_streak = true;
                Ok(PollStatus::Continue(pool.game_status))
            },
            FetchOutcome::Exhausted { attempts, last_error } => {
                self.api.record_feed_degraded(pool_id, attempts, &last_error.to_string()).await?;
                Ok(PollStatus::Continue(pool.game_status))
            },
        }
    }

    async fn settle(&self, snapshot: GameSnapshot) -> Result<PollStatus, SettlementError> {
        match self.api.process_snapshot(self.pool_id, &snapshot).await {
            Ok(SnapshotOutcome::Frozen) => Ok(PollStatus::Finished("the game is over".into())),
            Ok(SnapshotOutcome::Applied(result)) if result.pool.game_status == GameStatus::Post => {
                Ok(PollStatus::Finished("the game is over".into()))
            },
            Ok(SnapshotOutcome::Applied(result)) => Ok(PollStatus::Continue(result.pool.game_status)),
            Ok(SnapshotOutcome::Unchanged) => Ok(PollStatus::Continue(snapshot.status)),
            // Already audited. The next snapshot may well be fine.
            Err(SettlementError::Sync(_)) => Ok(PollStatus::Continue(snapshot.status)),
            Err(e) if e.halts_pool() => Ok(PollStatus::Finished(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Polls until the pool no longer needs it.
    pub async fn run(mut self) {
        info!("🕰️ Poller for pool #{} started", self.pool_id);
        loop {
            let delay = match self.poll_cycle().await {
                Ok(PollStatus::Continue(status)) => self.config.interval_for(status),
                Ok(PollStatus::Finished(reason)) => {
                    info!("🕰️ Poller for pool #{} stopping: {reason}", self.pool_id);
                    break;
                },
                Err(e @ SettlementError::Database(_)) => {
                    error!("🕰️ Poll cycle for pool #{} failed. {e}. Suspending the pool.", self.pool_id);
                    self.api.suspend(self.pool_id, &format!("Persistence failure. {e}")).await;
                    break;
                },
                Err(e) => {
                    error!("🕰️ Poll cycle for pool #{} failed. {e}", self.pool_id);
                    self.config.live_interval
                },
            };
            tokio::time::sleep(delay).await;
        }
    }
}
