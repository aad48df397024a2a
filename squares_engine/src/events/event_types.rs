use serde::{Deserialize, Serialize};

use crate::db_types::{AuditEvent, Severity, Winner};

/// Emitted once for every winner the settlement writer records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerSettledEvent {
    pub pool_id: i64,
    pub winner: Winner,
}

impl WinnerSettledEvent {
    pub fn new(winner: Winner) -> Self {
        Self { pool_id: winner.pool_id, winner }
    }
}

/// Emitted for every audit entry written by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecordedEvent {
    pub audit: AuditEvent,
}

impl AuditRecordedEvent {
    pub fn new(audit: AuditEvent) -> Self {
        Self { audit }
    }

    pub fn is_alert(&self) -> bool {
        self.audit.severity >= Severity::Warning
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    WinnerSettled(WinnerSettledEvent),
    AuditRecorded(AuditRecordedEvent),
}
