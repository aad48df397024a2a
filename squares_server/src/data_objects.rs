use serde::{Deserialize, Serialize};
use squares_engine::{
    axis::AxisNumbers,
    db_types::{Pool, ScoreEvent, Settlement, Winner},
    ApplyResult,
    SnapshotOutcome,
};

/// Body of `POST /admin/pools/{id}/lock`. Without a body, the numbers are drawn at random.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRequest {
    pub axis: AxisNumbers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockResponse {
    pub pool_id: i64,
    pub is_locked: bool,
    pub axis: Option<AxisNumbers>,
}

/// What an admin action wrote.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub pool_id: i64,
    pub outcome: &'static str,
    pub events: Vec<ScoreEvent>,
    pub settlements: Vec<Settlement>,
    pub winners: Vec<Winner>,
}

impl SettlementSummary {
    pub fn from_outcome(pool_id: i64, outcome: SnapshotOutcome) -> Self {
        match outcome {
            SnapshotOutcome::Applied(result) => Self::from_result("applied", result),
            SnapshotOutcome::Unchanged => Self::empty(pool_id, "unchanged"),
            SnapshotOutcome::Frozen => Self::empty(pool_id, "frozen"),
        }
    }

    pub fn from_result(outcome: &'static str, result: ApplyResult) -> Self {
        let ApplyResult { pool, events, settlements, winners, .. } = result;
        Self { pool_id: pool.id, outcome, events, settlements, winners }
    }

    fn empty(pool_id: i64, outcome: &'static str) -> Self {
        Self { pool_id, outcome, events: Vec::new(), settlements: Vec::new(), winners: Vec::new() }
    }
}

impl LockResponse {
    pub fn new(pool: &Pool, axis: Option<AxisNumbers>) -> Self {
        Self { pool_id: pool.id, is_locked: pool.is_locked, axis }
    }
}
