//! Per-pool rule configuration.
//!
//! A [`RuleConfig`] is read-only input to the resolver. It is validated when it is used for resolution, not only when
//! the pool is created, because the pool's axis numbers have to agree with it too.
use serde::{Deserialize, Serialize};
use sqp_common::BASIS_POINTS;
use thiserror::Error;

use crate::{axis::AxisNumbers, db_types::Checkpoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("numberSets must be 1 or 4, but was {0}")]
    InvalidNumberSets(i64),
    #[error("Expected {expected} axis number sets, but found {found}")]
    AxisSetCount { expected: i64, found: usize },
    #[error("Invalid axis numbers: {0}")]
    InvalidAxis(String),
    #[error("Invalid payout table: {0}")]
    InvalidPayout(String),
    #[error("The pool has no axis numbers. Lock the pool before settling checkpoints.")]
    MissingAxisNumbers,
}

//--------------------------------------     PayoutTable      ---------------------------------------------------------
/// Share of the pot paid at each checkpoint, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutTable {
    pub q1: i64,
    pub half: i64,
    pub q3: i64,
    #[serde(rename = "final")]
    pub final_score: i64,
    /// Paid for each score change when every score pays.
    pub per_score: i64,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self { q1: 2_000, half: 3_000, q3: 2_000, final_score: 3_000, per_score: 0 }
    }
}

impl PayoutTable {
    pub fn for_checkpoint(&self, checkpoint: Checkpoint) -> i64 {
        match checkpoint {
            Checkpoint::Q1 => self.q1,
            Checkpoint::Half => self.half,
            Checkpoint::Q3 => self.q3,
            Checkpoint::Final => self.final_score,
            Checkpoint::P1 | Checkpoint::P2 | Checkpoint::P3 | Checkpoint::P4 | Checkpoint::Ot => self.per_score,
        }
    }

    fn period_total(&self) -> i64 {
        self.q1 + self.half + self.q3 + self.final_score
    }
}

//--------------------------------------      RuleConfig      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub every_score_pays: bool,
    pub quarterly_rollover: bool,
    pub reverse_winners: bool,
    /// 1 for a single set of numbers for the whole game, 4 for fresh numbers every quarter.
    pub number_sets: i64,
    pub payouts: PayoutTable,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            every_score_pays: false,
            quarterly_rollover: false,
            reverse_winners: false,
            number_sets: 1,
            payouts: PayoutTable::default(),
        }
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if !matches!(self.number_sets, 1 | 4) {
            return Err(RuleError::InvalidNumberSets(self.number_sets));
        }
        let p = &self.payouts;
        for (name, bps) in
            [("q1", p.q1), ("half", p.half), ("q3", p.q3), ("final", p.final_score), ("perScore", p.per_score)]
        {
            if !(0..=BASIS_POINTS).contains(&bps) {
                return Err(RuleError::InvalidPayout(format!("{name} is {bps} bps, outside 0..={BASIS_POINTS}")));
            }
        }
        if p.period_total() > BASIS_POINTS {
            return Err(RuleError::InvalidPayout(format!(
                "period payouts add up to {} bps, more than the whole pot",
                p.period_total()
            )));
        }
        Ok(())
    }

    /// Checks the rules themselves, and that the axis numbers match them.
    pub fn validate_axis(&self, axis: &AxisNumbers) -> Result<(), RuleError> {
        self.validate()?;
        if axis.len() as i64 != self.number_sets {
            return Err(RuleError::AxisSetCount { expected: self.number_sets, found: axis.len() });
        }
        axis.sets().iter().try_for_each(|set| set.validate())
    }

    /// Which axis set applies at the given checkpoint.
    pub fn axis_set_index(&self, checkpoint: Checkpoint) -> usize {
        if self.number_sets == 4 {
            checkpoint.quarter_index()
        } else {
            0
        }
    }

    pub fn is_checkpoint(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::Q1 | Checkpoint::Half | Checkpoint::Q3 | Checkpoint::Final => true,
            _ => self.every_score_pays,
        }
    }
}
