use std::{collections::BTreeMap, fmt::Debug};

use serde::{Deserialize, Serialize};
use sqp_common::Cents;

use crate::{
    axis::AxisNumbers,
    db_types::{AuditEvent, PoolScores, ScoreEvent, Square, Winner},
    sqp_api::errors::PoolQueryError,
    traits::PoolQueries,
};

/// One line of the pool leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerWinnings {
    pub owner: String,
    pub wins: usize,
    pub total: Cents,
}

/// `PoolQueryApi` serves the read models of a pool. It only needs read access to the backend.
pub struct PoolQueryApi<B> {
    db: B,
}

impl<B> Debug for PoolQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoolQueryApi")
    }
}

impl<B: Clone> Clone for PoolQueryApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> PoolQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> PoolQueryApi<B>
where B: PoolQueries
{
    pub async fn scores(&self, pool_id: i64) -> Result<PoolScores, PoolQueryError> {
        let pool = self.db.fetch_pool(pool_id).await?.ok_or(PoolQueryError::PoolNotFound(pool_id))?;
        Ok(pool.scores())
    }

    /// Winners in settlement order.
    pub async fn winners(&self, pool_id: i64) -> Result<Vec<Winner>, PoolQueryError> {
        self.ensure_exists(pool_id).await?;
        let winners = self.db.fetch_winners(pool_id).await?;
        Ok(winners)
    }

    /// The audit log, oldest entry first.
    pub async fn audit_log(&self, pool_id: i64) -> Result<Vec<AuditEvent>, PoolQueryError> {
        self.ensure_exists(pool_id).await?;
        let events = self.db.fetch_audit_events(pool_id).await?;
        Ok(events)
    }

    pub async fn score_events(&self, pool_id: i64) -> Result<Vec<ScoreEvent>, PoolQueryError> {
        self.ensure_exists(pool_id).await?;
        let events = self.db.fetch_score_events(pool_id).await?;
        Ok(events)
    }

    pub async fn squares(&self, pool_id: i64) -> Result<Vec<Square>, PoolQueryError> {
        self.ensure_exists(pool_id).await?;
        let squares = self.db.fetch_squares(pool_id).await?;
        Ok(squares)
    }

    /// The axis numbers, once the pool is locked.
    pub async fn axis_numbers(&self, pool_id: i64) -> Result<Option<AxisNumbers>, PoolQueryError> {
        self.ensure_exists(pool_id).await?;
        let axis = self.db.fetch_axis_numbers(pool_id).await?;
        Ok(axis)
    }

    /// Total winnings per owner, biggest winner first. Ties are broken by name.
    pub async fn leaderboard(&self, pool_id: i64) -> Result<Vec<OwnerWinnings>, PoolQueryError> {
        let winners = self.winners(pool_id).await?;
        Ok(tally(&winners))
    }

    async fn ensure_exists(&self, pool_id: i64) -> Result<(), PoolQueryError> {
        match self.db.fetch_pool(pool_id).await? {
            Some(_) => Ok(()),
            None => Err(PoolQueryError::PoolNotFound(pool_id)),
        }
    }
}

fn tally(winners: &[Winner]) -> Vec<OwnerWinnings> {
    let mut totals = BTreeMap::<&str, (usize, Cents)>::new();
    for w in winners {
        let entry = totals.entry(w.owner.as_str()).or_default();
        entry.0 += 1;
        entry.1 += w.amount;
    }
    let mut result = totals
        .into_iter()
        .map(|(owner, (wins, total))| OwnerWinnings { owner: owner.to_string(), wins, total })
        .collect::<Vec<_>>();
    result.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.owner.cmp(&b.owner)));
    result
}
