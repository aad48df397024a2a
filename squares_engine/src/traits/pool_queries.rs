use crate::{
    axis::AxisNumbers,
    db_types::{AuditEvent, Pool, ScoreEvent, Settlement, Square, Winner},
    traits::PoolDatabaseError,
};

/// Read access to pools and everything settled for them.
///
/// All collections are returned in the order they were written.
#[allow(async_fn_in_trait)]
pub trait PoolQueries {
    async fn fetch_pool(&self, pool_id: i64) -> Result<Option<Pool>, PoolDatabaseError>;

    /// Pools the poller should watch: those with an external game id that are not finished or suspended.
    async fn fetch_active_pools(&self) -> Result<Vec<Pool>, PoolDatabaseError>;

    async fn fetch_squares(&self, pool_id: i64) -> Result<Vec<Square>, PoolDatabaseError>;

    async fn fetch_axis_numbers(&self, pool_id: i64) -> Result<Option<AxisNumbers>, PoolDatabaseError>;

    async fn fetch_score_events(&self, pool_id: i64) -> Result<Vec<ScoreEvent>, PoolDatabaseError>;

    async fn fetch_settlements(&self, pool_id: i64) -> Result<Vec<Settlement>, PoolDatabaseError>;

    async fn fetch_winners(&self, pool_id: i64) -> Result<Vec<Winner>, PoolDatabaseError>;

    async fn fetch_audit_events(&self, pool_id: i64) -> Result<Vec<AuditEvent>, PoolDatabaseError>;
}
