use mockall::mock;
use squares_engine::{
    axis::AxisNumbers,
    db_types::{
        AuditEvent,
        FeedStatus,
        NewAuditEvent,
        NewPool,
        Pool,
        PoolContext,
        ScoreEvent,
        Settlement,
        Square,
        Winner,
    },
    settlement::SnapshotPlan,
    ApplyResult,
    PoolDatabase,
    PoolDatabaseError,
    PoolQueries,
};

mock! {
    pub PoolReader {}
    impl PoolQueries for PoolReader {
        async fn fetch_pool(&self, pool_id: i64) -> Result<Option<Pool>, PoolDatabaseError>;
        async fn fetch_active_pools(&self) -> Result<Vec<Pool>, PoolDatabaseError>;
        async fn fetch_squares(&self, pool_id: i64) -> Result<Vec<Square>, PoolDatabaseError>;
        async fn fetch_axis_numbers(&self, pool_id: i64) -> Result<Option<AxisNumbers>, PoolDatabaseError>;
        async fn fetch_score_events(&self, pool_id: i64) -> Result<Vec<ScoreEvent>, PoolDatabaseError>;
        async fn fetch_settlements(&self, pool_id: i64) -> Result<Vec<Settlement>, PoolDatabaseError>;
        async fn fetch_winners(&self, pool_id: i64) -> Result<Vec<Winner>, PoolDatabaseError>;
        async fn fetch_audit_events(&self, pool_id: i64) -> Result<Vec<AuditEvent>, PoolDatabaseError>;
    }
}

mock! {
    pub PoolStore {}
    impl Clone for PoolStore {
        fn clone(&self) -> Self;
    }
    impl PoolQueries for PoolStore {
        async fn fetch_pool(&self, pool_id: i64) -> Result<Option<Pool>, PoolDatabaseError>;
        async fn fetch_active_pools(&self) -> Result<Vec<Pool>, PoolDatabaseError>;
        async fn fetch_squares(&self, pool_id: i64) -> Result<Vec<Square>, PoolDatabaseError>;
        async fn fetch_axis_numbers(&self, pool_id: i64) -> Result<Option<AxisNumbers>, PoolDatabaseError>;
        async fn fetch_score_events(&self, pool_id: i64) -> Result<Vec<ScoreEvent>, PoolDatabaseError>;
        async fn fetch_settlements(&self, pool_id: i64) -> Result<Vec<Settlement>, PoolDatabaseError>;
        async fn fetch_winners(&self, pool_id: i64) -> Result<Vec<Winner>, PoolDatabaseError>;
        async fn fetch_audit_events(&self, pool_id: i64) -> Result<Vec<AuditEvent>, PoolDatabaseError>;
    }
    impl PoolDatabase for PoolStore {
        fn url(&self) -> &str;
        async fn create_pool(&self, pool: NewPool) -> Result<Pool, PoolDatabaseError>;
        async fn assign_square(&self, pool_id: i64, position: i64, owner: &str, paid: bool) -> Result<Square, PoolDatabaseError>;
        async fn fetch_pool_context(&self, pool_id: i64) -> Result<PoolContext, PoolDatabaseError>;
        async fn assign_axis_numbers(&self, pool_id: i64, axis: &AxisNumbers) -> Result<Pool, PoolDatabaseError>;
        async fn apply_plan(&self, plan: &SnapshotPlan) -> Result<ApplyResult, PoolDatabaseError>;
        async fn record_audit(&self, pool_id: i64, audit: NewAuditEvent) -> Result<AuditEvent, PoolDatabaseError>;
        async fn set_feed_status(&self, pool_id: i64, status: FeedStatus, audit: NewAuditEvent) -> Result<AuditEvent, PoolDatabaseError>;
        async fn suspend_pool(&self, pool_id: i64, reason: &str, audit: NewAuditEvent) -> Result<AuditEvent, PoolDatabaseError>;
        async fn resume_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError>;
        async fn reset_pool(&self, pool_id: i64) -> Result<AuditEvent, PoolDatabaseError>;
    }
}
