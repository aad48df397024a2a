//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use serde_json::json;
use sqlx::SqlitePool;

use super::db::{audit, axis, db_url, new_pool, pools, score_events, settlements, squares};
use crate::{
    axis::AxisNumbers,
    db_types::{
        AuditEvent,
        AuditType,
        FeedStatus,
        NewAuditEvent,
        NewPool,
        Pool,
        PoolContext,
        ScoreEvent,
        Settlement,
        SettlementOutcome,
        Square,
        Winner,
    },
    settlement::SnapshotPlan,
    traits::{ApplyResult, PoolDatabase, PoolDatabaseError, PoolQueries},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PoolQueries for SqliteDatabase {
    async fn fetch_pool(&self, pool_id: i64) -> Result<Option<Pool>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let pool = pools::fetch_pool(pool_id, &mut conn).await?;
        Ok(pool)
    }

    async fn fetch_active_pools(&self) -> Result<Vec<Pool>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let pools = pools::fetch_active_pools(&mut conn).await?;
        Ok(pools)
    }

    async fn fetch_squares(&self, pool_id: i64) -> Result<Vec<Square>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let squares = squares::fetch_squares(pool_id, &mut conn).await?;
        Ok(squares)
    }

    async fn fetch_axis_numbers(&self, pool_id: i64) -> Result<Option<AxisNumbers>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        axis::fetch_axis_numbers(pool_id, &mut conn).await
    }

    async fn fetch_score_events(&self, pool_id: i64) -> Result<Vec<ScoreEvent>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let events = score_events::fetch_score_events(pool_id, &mut conn).await?;
        Ok(events)
    }

    async fn fetch_settlements(&self, pool_id: i64) -> Result<Vec<Settlement>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let result = settlements::fetch_settlements(pool_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_winners(&self, pool_id: i64) -> Result<Vec<Winner>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let winners = settlements::fetch_winners(pool_id, &mut conn).await?;
        Ok(winners)
    }

    async fn fetch_audit_events(&self, pool_id: i64) -> Result<Vec<AuditEvent>, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let events = audit::fetch_audit_events(pool_id, &mut conn).await?;
        Ok(events)
    }
}

impl PoolDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_pool(&self, pool: NewPool) -> Result<Pool, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        pools::insert_pool(pool, &mut conn).await
    }

    async fn assign_square(
        &self,
        pool_id: i64,
        position: i64,
        owner: &str,
        paid: bool,
    ) -> Result<Square, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let pool = pools::fetch_existing_pool(pool_id, &mut tx).await?;
        if pool.is_locked {
            return Err(PoolDatabaseError::PoolLocked(pool_id));
        }
        let square = squares::insert_square(pool_id, position, owner, paid, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Square {position} in pool #{pool_id} assigned to {owner}");
        Ok(square)
    }

    async fn fetch_pool_context(&self, pool_id: i64) -> Result<PoolContext, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let pool = pools::fetch_existing_pool(pool_id, &mut tx).await?;
        let squares = squares::fetch_squares(pool_id, &mut tx).await?;
        let axis = axis::fetch_axis_numbers(pool_id, &mut tx).await?;
        let distributed = settlements::distributed_total(pool_id, &mut tx).await?;
        tx.commit().await?;
        Ok(PoolContext { pool, squares, axis, distributed })
    }

    async fn assign_axis_numbers(&self, pool_id: i64, numbers: &AxisNumbers) -> Result<Pool, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let pool = pools::fetch_existing_pool(pool_id, &mut tx).await?;
        if pool.is_locked {
            return Err(PoolDatabaseError::AlreadyLocked(pool_id));
        }
        if axis::fetch_axis_numbers(pool_id, &mut tx).await?.is_some() {
            let reason = "numbers have already been drawn".to_string();
            return Err(PoolDatabaseError::AxisImmutable { pool_id, reason });
        }
        if settlements::count_settlements(pool_id, &mut tx).await? > 0 {
            let reason = "checkpoints have already been settled".to_string();
            return Err(PoolDatabaseError::AxisImmutable { pool_id, reason });
        }
        pool.rules().validate_axis(numbers)?;
        axis::insert_axis_numbers(pool_id, numbers, &mut tx).await?;
        let pool = pools::set_locked(pool_id, true, &mut tx).await?;
        let sets = numbers
            .sets()
            .iter()
            .map(|s| json!({"home": s.home_digits(), "away": s.away_digits()}))
            .collect::<Vec<_>>();
        let audit = NewAuditEvent::info(
            AuditType::AxisAssigned,
            format!("Pool locked. {} set(s) of axis numbers drawn.", numbers.len()),
        )
        .with_payload(json!({ "sets": sets }));
        audit::insert_audit(pool_id, audit, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Axis numbers for pool #{pool_id} saved");
        Ok(pool)
    }

    /// Takes a snapshot plan, and in a single atomic transaction,
    /// * updates the pool row, if and only if its version still matches the plan,
    /// * stores the new score events, skipping any that already exist,
    /// * stores each settlement that is not already settled, along with its winner (if paid) and audit entry,
    /// * stores the extra audit entries of the plan.
    async fn apply_plan(&self, plan: &SnapshotPlan) -> Result<ApplyResult, PoolDatabaseError> {
        let pool_id = plan.pool_id;
        let mut tx = self.pool.begin().await?;
        let pool = match pools::update_state(pool_id, plan.expected_version, &plan.state, &mut tx).await? {
            Some(pool) => pool,
            None => {
                tx.rollback().await?;
                debug!("🗃️ Pool #{pool_id} has moved on from version {}. Plan discarded.", plan.expected_version);
                return Err(PoolDatabaseError::VersionConflict { pool_id, version: plan.expected_version });
            },
        };
        let mut result = ApplyResult::new(pool);
        for event in &plan.events {
            if let Some(event) = score_events::idempotent_insert(pool_id, event, &mut tx).await? {
                result.events.push(event);
            }
        }
        for new_settlement in &plan.settlements {
            let Some(settlement) = settlements::idempotent_insert(pool_id, new_settlement, &mut tx).await? else {
                debug!(
                    "🗃️ {} at {}-{} is already settled for pool #{pool_id}",
                    new_settlement.checkpoint, new_settlement.home_score, new_settlement.away_score
                );
                continue;
            };
            if let (SettlementOutcome::Paid, Some(owner)) = (settlement.outcome, new_settlement.owner.as_deref()) {
                let winner = settlements::insert_winner(&settlement, owner, &new_settlement.description, &mut tx).await?;
                result.winners.push(winner);
            }
            if let Some(audit) = new_settlement.audit_event() {
                result.audits.push(audit::insert_audit(pool_id, audit, &mut tx).await?);
            }
            result.settlements.push(settlement);
        }
        for audit in &plan.audits {
            result.audits.push(audit::insert_audit(pool_id, audit.clone(), &mut tx).await?);
        }
        tx.commit().await?;
        trace!(
            "🗃️ Plan for pool #{pool_id} applied. {} events, {} settlements, {} winners",
            result.events.len(),
            result.settlements.len(),
            result.winners.len()
        );
        Ok(result)
    }

    async fn record_audit(&self, pool_id: i64, audit: NewAuditEvent) -> Result<AuditEvent, PoolDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let event = audit::insert_audit(pool_id, audit, &mut conn).await?;
        Ok(event)
    }

    async fn set_feed_status(
        &self,
        pool_id: i64,
        status: FeedStatus,
        audit: NewAuditEvent,
    ) -> Result<AuditEvent, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        pools::set_feed_status(pool_id, status, &mut tx).await?;
        let event = audit::insert_audit(pool_id, audit, &mut tx).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn suspend_pool(
        &self,
        pool_id: i64,
        reason: &str,
        audit: NewAuditEvent,
    ) -> Result<AuditEvent, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        pools::set_suspended(pool_id, Some(reason), &mut tx).await?;
        let event = audit::insert_audit(pool_id, audit, &mut tx).await?;
        tx.commit().await?;
        warn!("🗃️ Pool #{pool_id} suspended. {reason}");
        Ok(event)
    }

    async fn resume_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        pools::set_suspended(pool_id, None, &mut tx).await?;
        let audit = NewAuditEvent::info(AuditType::Resumed, "Automated processing resumed");
        let event = audit::insert_audit(pool_id, audit, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Pool #{pool_id} resumed");
        Ok(event)
    }

    async fn reset_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError> {
        let mut tx = self.pool.begin().await?;
        pools::reset_state(pool_id, &mut tx).await?;
        let settled = settlements::delete_settlements(pool_id, &mut tx).await?;
        let events = score_events::delete_score_events(pool_id, &mut tx).await?;
        let sets = axis::delete_axis_numbers(pool_id, &mut tx).await?;
        let audit = NewAuditEvent::warning(
            AuditType::Reset,
            format!("Pool reset. {settled} settlements, {events} score events and {sets} axis sets cleared."),
        )
        .with_payload(json!({ "settlements": settled, "scoreEvents": events, "axisSets": sets }));
        let event = audit::insert_audit(pool_id, audit, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Pool #{pool_id} has been reset");
        Ok(event)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
