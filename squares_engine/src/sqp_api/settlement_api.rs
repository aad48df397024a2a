use std::fmt::Debug;

use log::*;
use serde_json::json;
use sqp_common::{GameSnapshot, GameStatus};

use crate::{
    axis::AxisNumbers,
    db_types::{AuditEvent, AuditType, FeedStatus, NewAuditEvent, NewPool, Pool, Square, Winner},
    events::{AuditRecordedEvent, EventProducers, WinnerSettledEvent},
    settlement::{plan_resettle, plan_snapshot, PlanError},
    sqp_api::{errors::SettlementError, simulation::SimulationRequest},
    traits::{ApplyResult, PoolDatabase, PoolDatabaseError},
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementConfig {
    /// How many times a snapshot is re-planned after losing a race for the pool row.
    pub max_attempts: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

/// What became of a snapshot handed to [`SettlementApi::process_snapshot`].
#[derive(Debug, Clone)]
pub enum SnapshotOutcome {
    /// The snapshot moved the game on. Contains the rows that were written.
    Applied(ApplyResult),
    /// Score, period and status all match what is stored.
    Unchanged,
    /// The game is over. Nothing changes until an admin resets the pool.
    Frozen,
}

impl SnapshotOutcome {
    pub fn winners(&self) -> &[Winner] {
        match self {
            SnapshotOutcome::Applied(result) => result.winners.as_slice(),
            _ => &[],
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SnapshotOutcome::Applied(_))
    }
}

/// `SettlementApi` is the single entry point into the settlement pipeline.
///
/// Feed snapshots, admin simulations and resettles all build a plan from a consistent read of the pool and hand it
/// to the backend's settlement writer. Losing the race for the pool row is retried with a fresh read, up to
/// [`SettlementConfig::max_attempts`] times. Anything that cannot be fixed by retrying suspends the pool.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    config: SettlementConfig,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.config)
    }
}

impl<B: Clone> Clone for SettlementApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone(), config: self.config }
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, config: SettlementConfig::default() }
    }

    pub fn with_config(mut self, config: SettlementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }
}

impl<B> SettlementApi<B>
where B: PoolDatabase
{
    pub async fn create_pool(&self, pool: NewPool) -> Result<Pool, SettlementError> {
        let pool = self.db.create_pool(pool).await?;
        info!("🏈️ Pool #{} ({}) created", pool.id, pool.name);
        Ok(pool)
    }

    pub async fn assign_square(
        &self,
        pool_id: i64,
        position: i64,
        owner: &str,
        paid: bool,
    ) -> Result<Square, SettlementError> {
        let square = self.db.assign_square(pool_id, position, owner, paid).await?;
        Ok(square)
    }

    /// Locks the pool, drawing fresh random axis numbers for it.
    pub async fn lock_pool(&self, pool_id: i64) -> Result<Pool, SettlementError> {
        let pool = self.fetch_pool(pool_id).await?;
        let axis = {
            let mut rng = rand::thread_rng();
            AxisNumbers::generate(pool.number_sets, &mut rng)
        };
        self.lock_pool_with_axis(pool_id, axis).await
    }

    /// Locks the pool with the given axis numbers.
    pub async fn lock_pool_with_axis(&self, pool_id: i64, axis: AxisNumbers) -> Result<Pool, SettlementError> {
        let pool = self.db.assign_axis_numbers(pool_id, &axis).await?;
        for set in axis.sets() {
            debug!("🎲️ Pool #{pool_id} axis. Home: {} Away: {}", set.home_digits(), set.away_digits());
        }
        info!("🎲️ Pool #{pool_id} is locked");
        Ok(pool)
    }

    /// Runs a snapshot through the normalizer, resolver and settlement writer.
    ///
    /// A snapshot that does not differ from the stored score, period and status is [`SnapshotOutcome::Unchanged`].
    /// Snapshots for finished games are [`SnapshotOutcome::Frozen`]. A snapshot that contradicts the stored state is
    /// skipped with a `SYNC_ERROR` warning and the stored scores are left alone.
    pub async fn process_snapshot(
        &self,
        pool_id: i64,
        snapshot: &GameSnapshot,
    ) -> Result<SnapshotOutcome, SettlementError> {
        match self.settle_snapshot(pool_id, snapshot).await {
            Err(SettlementError::Sync(e)) => {
                warn!("🏈️ Snapshot for pool #{pool_id} skipped. {e}");
                let message = format!("Snapshot skipped. {e}");
                if self.repeats_last_audit(pool_id, AuditType::SyncError, &message).await {
                    debug!("🏈️ Pool #{pool_id} already has this sync error on record. Not auditing it again.");
                } else {
                    let audit = NewAuditEvent::warning(AuditType::SyncError, message)
                        .with_payload(json!({ "snapshot": snapshot }));
                    self.audit(pool_id, audit).await;
                }
                Err(SettlementError::Sync(e))
            },
            other => other,
        }
    }

    /// Applies a synthetic play through the same pipeline as the feed.
    pub async fn simulate(&self, pool_id: i64, request: SimulationRequest) -> Result<SnapshotOutcome, SettlementError> {
        let pool = self.fetch_pool(pool_id).await?;
        let current = pool.snapshot();
        let next = {
            let mut rng = rand::thread_rng();
            request.next_snapshot(&current, &mut rng)?
        };
        info!(
            "🏈️ Simulating for pool #{pool_id}: {}-{} P{} ({}) -> {}-{} P{} ({})",
            current.home_score,
            current.away_score,
            current.period,
            current.status,
            next.home_score,
            next.away_score,
            next.period,
            next.status
        );
        let audit = NewAuditEvent::info(
            AuditType::Simulation,
            format!("Simulated snapshot {}-{}, period {}, {}", next.home_score, next.away_score, next.period, next.status),
        )
        .with_payload(json!({ "request": request, "snapshot": next }));
        self.audit(pool_id, audit).await;
        self.process_snapshot(pool_id, &next).await
    }

    /// Re-runs the normalizer and resolver against the stored score event history and settles whatever is missing.
    /// A resettle lifts a suspension. A failed resettle is audited as an error, but does not suspend the pool.
    pub async fn fix(&self, pool_id: i64) -> Result<ApplyResult, SettlementError> {
        let result = self.resettle(pool_id).await;
        if let Err(e) = &result {
            if !matches!(e, SettlementError::PoolNotFound(_)) {
                error!("🏈️ Resettle of pool #{pool_id} failed. {e}");
                self.audit(pool_id, NewAuditEvent::error(AuditType::Resettle, format!("Resettle failed. {e}"))).await;
            }
        }
        result
    }

    async fn resettle(&self, pool_id: i64) -> Result<ApplyResult, SettlementError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let ctx = self.db.fetch_pool_context(pool_id).await?;
            let history = self.db.fetch_score_events(pool_id).await?;
            let existing = self.db.fetch_settlements(pool_id).await?;
            let plan = plan_resettle(&ctx, &history, &existing)?;
            match self.db.apply_plan(&plan).await {
                Ok(result) => {
                    info!(
                        "🏈️ Pool #{pool_id} resettled. {} events and {} settlements were missing.",
                        result.events.len(),
                        result.settlements.len()
                    );
                    self.publish(&result).await;
                    return Ok(result);
                },
                Err(e) if e.is_conflict() && attempt < self.config.max_attempts => {
                    debug!("🏈️ Resettle of pool #{pool_id} lost a race (attempt {attempt}). Trying again.");
                },
                Err(e) if e.is_conflict() => {
                    return Err(SettlementError::Conflict { pool_id, attempts: attempt });
                },
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Clears axis numbers, score events and winners, and sends the pool back to `pre`.
    pub async fn reset(&self, pool_id: i64) -> Result<AuditEvent, SettlementError> {
        let audit = self.db.reset_pool(pool_id).await?;
        self.publish_audits(std::slice::from_ref(&audit)).await;
        Ok(audit)
    }

    pub async fn resume(&self, pool_id: i64) -> Result<AuditEvent, SettlementError> {
        let pool = self.fetch_pool(pool_id).await?;
        if !pool.suspended {
            debug!("🏈️ Pool #{pool_id} is not suspended. Resuming anyway.");
        }
        let audit = self.db.resume_pool(pool_id).await?;
        self.publish_audits(std::slice::from_ref(&audit)).await;
        Ok(audit)
    }

    /// Marks the feed for the pool as degraded. Audited only on the transition from healthy.
    pub async fn record_feed_degraded(&self, pool_id: i64, attempts: u32, reason: &str) -> Result<(), SettlementError> {
        let pool = self.fetch_pool(pool_id).await?;
        if pool.feed_status == FeedStatus::Degraded {
            debug!("📡️ Feed for pool #{pool_id} is still degraded. {reason}");
            return Ok(());
        }
        let audit = NewAuditEvent::error(
            AuditType::FeedFetchFail,
            format!("feed fetch failed: degraded after {attempts} attempts. {reason}"),
        )
        .with_payload(json!({ "attempts": attempts, "reason": reason }));
        let event = self.db.set_feed_status(pool_id, FeedStatus::Degraded, audit).await?;
        error!("📡️ Feed for pool #{pool_id} is degraded. {reason}");
        self.publish_audits(std::slice::from_ref(&event)).await;
        Ok(())
    }

    /// Marks the feed for the pool as healthy again. Audited only if it was degraded.
    pub async fn record_feed_recovered(&self, pool_id: i64) -> Result<(), SettlementError> {
        let pool = self.fetch_pool(pool_id).await?;
        if pool.feed_status == FeedStatus::Healthy {
            return Ok(());
        }
        let audit = NewAuditEvent::info(AuditType::FeedFetchSuccess, "feed recovered");
        let event = self.db.set_feed_status(pool_id, FeedStatus::Healthy, audit).await?;
        info!("📡️ Feed for pool #{pool_id} recovered");
        self.publish_audits(std::slice::from_ref(&event)).await;
        Ok(())
    }

    pub async fn record_malformed_payload(&self, pool_id: i64, reason: &str) -> Result<(), SettlementError> {
        let audit =
            NewAuditEvent::error(AuditType::FeedFetchFail, format!("feed fetch failed: malformed payload. {reason}"));
        let event = self.db.record_audit(pool_id, audit).await?;
        self.publish_audits(std::slice::from_ref(&event)).await;
        Ok(())
    }

    async fn fetch_pool(&self, pool_id: i64) -> Result<Pool, SettlementError> {
        self.db.fetch_pool(pool_id).await?.ok_or(SettlementError::PoolNotFound(pool_id))
    }

    /// Read, plan, write; repeated while the write loses the race for the pool row.
    async fn settle_snapshot(&self, pool_id: i64, snapshot: &GameSnapshot) -> Result<SnapshotOutcome, SettlementError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let ctx = match self.db.fetch_pool_context(pool_id).await {
                Ok(ctx) => ctx,
                Err(PoolDatabaseError::PoolNotFound(id)) => return Err(SettlementError::PoolNotFound(id)),
                Err(e) => {
                    let reason = format!("Persistence failure. {e}");
                    self.suspend(pool_id, &reason).await;
                    return Err(e.into());
                },
            };
            let pool = &ctx.pool;
            if pool.suspended {
                let reason = pool.suspended_reason.clone().unwrap_or_default();
                return Err(SettlementError::Suspended { pool_id, reason });
            }
            if pool.game_status == GameStatus::Post {
                trace!("🏈️ Pool #{pool_id} is final. Snapshot ignored.");
                return Ok(SnapshotOutcome::Frozen);
            }
            if snapshot.same_state(pool.home_score, pool.away_score, pool.period, pool.game_status) {
                return Ok(SnapshotOutcome::Unchanged);
            }
            let plan = match plan_snapshot(&ctx, snapshot) {
                Ok(plan) => plan,
                Err(PlanError::Sync(e)) => return Err(SettlementError::Sync(e)),
                Err(PlanError::Rules(e)) => {
                    let reason = format!("Configuration error. {e}");
                    self.suspend(pool_id, &reason).await;
                    return Err(SettlementError::Configuration(e));
                },
            };
            match self.db.apply_plan(&plan).await {
                Ok(result) => {
                    for winner in &result.winners {
                        info!(
                            "🏈️ Pool #{pool_id}: {} wins {} at {} ({}-{})",
                            winner.owner, winner.amount, winner.period, winner.home_score, winner.away_score
                        );
                    }
                    self.publish(&result).await;
                    return Ok(SnapshotOutcome::Applied(result));
                },
                Err(e) if e.is_conflict() && attempt < self.config.max_attempts => {
                    debug!("🏈️ Pool #{pool_id} changed while settling (attempt {attempt}). Trying again.");
                },
                Err(e) if e.is_conflict() => {
                    let reason = format!("Settlement conflict persisted after {attempt} attempts");
                    self.suspend(pool_id, &reason).await;
                    return Err(SettlementError::Conflict { pool_id, attempts: attempt });
                },
                Err(e) => {
                    let reason = format!("Persistence failure. {e}");
                    self.suspend(pool_id, &reason).await;
                    return Err(e.into());
                },
            }
        }
    }

    /// Suspends automated processing for the pool, with an ERROR audit entry. Failures are logged, never propagated.
    pub async fn suspend(&self, pool_id: i64, reason: &str) {
        let audit = NewAuditEvent::error(AuditType::Suspended, format!("Automated processing suspended. {reason}"));
        match self.db.suspend_pool(pool_id, reason, audit).await {
            Ok(event) => self.publish_audits(std::slice::from_ref(&event)).await,
            Err(e) => error!("🏈️ Could not suspend pool #{pool_id} ({reason}). {e}"),
        }
    }

    /// True if the newest audit entry of the pool has this type and message.
    async fn repeats_last_audit(&self, pool_id: i64, event_type: AuditType, message: &str) -> bool {
        match self.db.fetch_audit_events(pool_id).await {
            Ok(audits) => audits.last().is_some_and(|a| a.event_type == event_type && a.message == message),
            Err(e) => {
                warn!("🏈️ Could not read the audit log of pool #{pool_id}. {e}");
                false
            },
        }
    }

    /// Writes an audit entry. Failures are logged, never propagated.
    async fn audit(&self, pool_id: i64, audit: NewAuditEvent) {
        match self.db.record_audit(pool_id, audit).await {
            Ok(event) => self.publish_audits(std::slice::from_ref(&event)).await,
            Err(e) => error!("🏈️ Could not write audit entry for pool #{pool_id}. {e}"),
        }
    }

    async fn publish(&self, result: &ApplyResult) {
        for producer in &self.producers.winner_settled_producer {
            for winner in &result.winners {
                producer.publish_event(WinnerSettledEvent::new(winner.clone())).await;
            }
        }
        self.publish_audits(&result.audits).await;
    }

    async fn publish_audits(&self, audits: &[AuditEvent]) {
        for producer in &self.producers.audit_recorded_producer {
            for audit in audits {
                producer.publish_event(AuditRecordedEvent::new(audit.clone())).await;
            }
        }
    }
}
