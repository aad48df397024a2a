use crate::db_types::{AuditEvent, Pool, ScoreEvent, Settlement, Winner};

/// The rows actually written when a plan was applied. Replayed rows that already existed are not included.
#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub pool: Pool,
    pub events: Vec<ScoreEvent>,
    pub settlements: Vec<Settlement>,
    pub winners: Vec<Winner>,
    pub audits: Vec<AuditEvent>,
}

impl ApplyResult {
    pub fn new(pool: Pool) -> Self {
        Self { pool, events: Vec::new(), settlements: Vec::new(), winners: Vec::new(), audits: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.settlements.is_empty()
    }
}
