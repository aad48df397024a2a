use thiserror::Error;

use crate::{
    axis::AxisNumbers,
    db_types::{AuditEvent, FeedStatus, NewAuditEvent, NewPool, Pool, PoolContext, Square},
    rules::RuleError,
    settlement::SnapshotPlan,
    traits::{ApplyResult, PoolQueries},
};

#[derive(Debug, Error)]
pub enum PoolDatabaseError {
    #[error("Database error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Pool #{0} does not exist")]
    PoolNotFound(i64),
    #[error("Pool #{pool_id} was modified concurrently (expected version {version})")]
    VersionConflict { pool_id: i64, version: i64 },
    #[error("Pool #{0} is already locked")]
    AlreadyLocked(i64),
    #[error("Pool #{0} is locked. Squares cannot change hands after the numbers are drawn.")]
    PoolLocked(i64),
    #[error("Axis numbers for pool #{pool_id} cannot be assigned: {reason}")]
    AxisImmutable { pool_id: i64, reason: String },
    #[error("Square {0} is not on the grid")]
    InvalidSquare(i64),
    #[error("Square {position} in pool #{pool_id} already has an owner")]
    SquareTaken { pool_id: i64, position: i64 },
    #[error("Invalid pool configuration. {0}")]
    InvalidRules(#[from] RuleError),
    #[error("Stored data is corrupt: {0}")]
    CorruptData(String),
}

impl PoolDatabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// The write path of the settlement engine.
///
/// Every method runs in its own transaction. Methods that change the pool row bump its version, so a plan computed
/// before such a change will be rejected by [`Self::apply_plan`].
#[allow(async_fn_in_trait)]
pub trait PoolDatabase: Clone + PoolQueries {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a pool in the `pre` state with an empty grid. The rules are validated first.
    async fn create_pool(&self, pool: NewPool) -> Result<Pool, PoolDatabaseError>;

    /// Gives a square to `owner`. Only possible before the pool locks.
    async fn assign_square(
        &self,
        pool_id: i64,
        position: i64,
        owner: &str,
        paid: bool,
    ) -> Result<Square, PoolDatabaseError>;

    /// Reads the pool, its grid, axis numbers and the total paid so far, all from one snapshot of the database.
    async fn fetch_pool_context(&self, pool_id: i64) -> Result<PoolContext, PoolDatabaseError>;

    /// Stores the axis numbers and locks the pool.
    ///
    /// Refused if the pool is already locked, already has numbers, or has any settled checkpoint. The numbers of a
    /// pool are never replaced; only an administrative reset clears them.
    async fn assign_axis_numbers(&self, pool_id: i64, axis: &AxisNumbers) -> Result<Pool, PoolDatabaseError>;

    /// The settlement writer. Applies a plan atomically.
    ///
    /// The pool row is only updated if its version still matches `plan.expected_version`; otherwise nothing is
    /// written and [`PoolDatabaseError::VersionConflict`] is returned. Score events and settlements whose keys already
    /// exist are skipped, so applying the same plan twice settles each checkpoint once.
    async fn apply_plan(&self, plan: &SnapshotPlan) -> Result<ApplyResult, PoolDatabaseError>;

    async fn record_audit(&self, pool_id: i64, audit: NewAuditEvent) -> Result<AuditEvent, PoolDatabaseError>;

    /// Updates the feed health flag and writes the accompanying audit entry.
    async fn set_feed_status(
        &self,
        pool_id: i64,
        status: FeedStatus,
        audit: NewAuditEvent,
    ) -> Result<AuditEvent, PoolDatabaseError>;

    /// Halts automated processing for the pool. The audit entry is written in the same transaction.
    async fn suspend_pool(
        &self,
        pool_id: i64,
        reason: &str,
        audit: NewAuditEvent,
    ) -> Result<AuditEvent, PoolDatabaseError>;

    async fn resume_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError>;

    /// Clears axis numbers, score events, settlements and winners, and returns the pool to `pre`. Squares and the
    /// audit log are kept.
    async fn reset_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError>;
}
