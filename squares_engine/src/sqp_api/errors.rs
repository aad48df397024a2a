use thiserror::Error;

use crate::{normalizer::SyncError, rules::RuleError, settlement::PlanError, traits::PoolDatabaseError};

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    Database(PoolDatabaseError),
    #[error("Pool #{0} does not exist")]
    PoolNotFound(i64),
    #[error("Automated processing for pool #{pool_id} is suspended. {reason}")]
    Suspended { pool_id: i64, reason: String },
    #[error("Pool configuration error. {0}")]
    Configuration(#[from] RuleError),
    #[error("Could not settle pool #{pool_id} after {attempts} attempts. The pool kept changing underneath us.")]
    Conflict { pool_id: i64, attempts: u32 },
    #[error("Snapshot rejected. {0}")]
    Sync(#[from] SyncError),
    #[error("Invalid simulation. {0}")]
    InvalidSimulation(String),
}

impl SettlementError {
    /// Errors that leave the pool suspended until an admin steps in.
    pub fn halts_pool(&self) -> bool {
        matches!(self, Self::Suspended { .. } | Self::Configuration(_) | Self::Conflict { .. } | Self::Database(_))
    }
}

impl From<PoolDatabaseError> for SettlementError {
    fn from(e: PoolDatabaseError) -> Self {
        match e {
            PoolDatabaseError::PoolNotFound(id) => Self::PoolNotFound(id),
            PoolDatabaseError::InvalidRules(e) => Self::Configuration(e),
            e => Self::Database(e),
        }
    }
}

impl From<PlanError> for SettlementError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Sync(e) => SettlementError::Sync(e),
            PlanError::Rules(e) => SettlementError::Configuration(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolQueryError {
    #[error("Database error: {0}")]
    Database(#[from] PoolDatabaseError),
    #[error("Pool #{0} does not exist")]
    PoolNotFound(i64),
}
