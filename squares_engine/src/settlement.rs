//! Settlement planning.
//!
//! A snapshot is settled in two steps. First a [`SnapshotPlan`] is built from a consistent read of the pool
//! ([`PoolContext`]): the normalizer derives score events, the resolver settles every checkpoint among them, and the
//! new pool state is worked out. Nothing is written while planning. Then the storage backend applies the whole plan
//! in one transaction, guarded by the pool version the plan was built from. If the version moved, the plan is stale
//! and is thrown away; the caller reads again and builds a fresh one.
use std::collections::HashSet;

use serde_json::json;
use sqp_common::{Cents, GameSnapshot, GameStatus};
use thiserror::Error;

use crate::{
    db_types::{
        AuditType,
        Checkpoint,
        EventKind,
        NewAuditEvent,
        NewScoreEvent,
        NewSettlement,
        Pool,
        PoolContext,
        ScoreEvent,
        ScorePair,
        Settlement,
        SettlementOutcome,
    },
    normalizer::{normalize, SyncError},
    resolver::{resolve, PotState},
    rules::RuleError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Snapshot is out of sync with the stored game state. {0}")]
    Sync(#[from] SyncError),
    #[error("Pool configuration error. {0}")]
    Rules(#[from] RuleError),
}

//--------------------------------------      PoolState       ---------------------------------------------------------
/// The mutable columns of a pool row, as they should be after a plan is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub game_status: GameStatus,
    pub period: i64,
    pub clock: Option<String>,
    pub current: ScorePair,
    pub q1: Option<ScorePair>,
    pub half: Option<ScorePair>,
    pub q3: Option<ScorePair>,
    pub final_score: Option<ScorePair>,
    pub rollover_pot: Cents,
    pub last_digits: Option<(u8, u8)>,
    pub suspended: bool,
    pub suspended_reason: Option<String>,
}

impl PoolState {
    pub fn from_pool(pool: &Pool) -> Self {
        let scores = pool.scores();
        Self {
            game_status: pool.game_status,
            period: pool.period,
            clock: pool.clock.clone(),
            current: scores.current,
            q1: scores.q1,
            half: scores.half,
            q3: scores.q3,
            final_score: scores.final_score,
            rollover_pot: pool.rollover_pot,
            last_digits: pool.last_digits(),
            suspended: pool.suspended,
            suspended_reason: pool.suspended_reason.clone(),
        }
    }

    fn set_snapshot(&mut self, snapshot: &GameSnapshot) {
        self.game_status = snapshot.status;
        self.period = snapshot.period;
        self.clock = snapshot.clock.clone();
        self.current = ScorePair::new(snapshot.home_score, snapshot.away_score);
    }

    fn record_period_end(&mut self, event: &NewScoreEvent) {
        let score = Some(event.score());
        match event.checkpoint {
            Checkpoint::Q1 => self.q1 = score,
            Checkpoint::Half => self.half = score,
            Checkpoint::Q3 => self.q3 = score,
            Checkpoint::Final => self.final_score = score,
            _ => {},
        }
    }
}

//--------------------------------------     SnapshotPlan     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct SnapshotPlan {
    pub pool_id: i64,
    /// The pool version this plan was computed from.
    pub expected_version: i64,
    pub events: Vec<NewScoreEvent>,
    pub settlements: Vec<NewSettlement>,
    /// Audit entries written alongside the plan, in addition to one per settlement.
    pub audits: Vec<NewAuditEvent>,
    pub state: PoolState,
}

impl SnapshotPlan {
    pub fn paid_total(&self) -> Cents {
        self.settlements.iter().filter(|s| s.outcome == SettlementOutcome::Paid).map(|s| s.amount).sum()
    }
}

/// Settles every checkpoint among `events`, in order, threading the pot state through.
fn settle_events(
    ctx: &PoolContext,
    events: &[NewScoreEvent],
    pot: &mut PotState,
    state: &mut PoolState,
) -> Result<Vec<NewSettlement>, RuleError> {
    let rules = ctx.pool.rules();
    let grid = ctx.grid();
    let mut settlements = Vec::new();
    for event in events {
        if event.kind == EventKind::PeriodEnd {
            state.record_period_end(event);
        }
        if let Some(resolution) = resolve(event, &rules, ctx.axis.as_ref(), &grid, pot)? {
            pot.advance(&resolution);
            settlements.push(resolution.to_settlement(event));
        }
    }
    Ok(settlements)
}

/// Plans the effect of a new snapshot on the pool.
pub fn plan_snapshot(ctx: &PoolContext, snapshot: &GameSnapshot) -> Result<SnapshotPlan, PlanError> {
    let pool = &ctx.pool;
    let events = normalize(&pool.snapshot(), snapshot)?;
    let mut state = PoolState::from_pool(pool);
    state.set_snapshot(snapshot);
    let mut pot = PotState {
        pot: ctx.pot(),
        distributed: ctx.distributed,
        rollover: pool.rollover_pot,
        last_digits: pool.last_digits(),
    };
    let settlements = settle_events(ctx, &events, &mut pot, &mut state)?;
    state.rollover_pot = pot.rollover;
    state.last_digits = pot.last_digits;
    Ok(SnapshotPlan {
        pool_id: pool.id,
        expected_version: pool.version,
        events,
        settlements,
        audits: Vec::new(),
        state,
    })
}

/// Rebuilds the sequence of snapshots implied by the stored score event log, ending at the pool's current state.
fn replay_steps(pool: &Pool, history: &[ScoreEvent]) -> Vec<GameSnapshot> {
    let mut steps = history
        .iter()
        .map(|e| match (e.kind, e.checkpoint) {
            (EventKind::ScoreChange, _) => GameSnapshot::new(e.home_score, e.away_score, e.period, GameStatus::In),
            (EventKind::PeriodEnd, Checkpoint::Final) => {
                GameSnapshot::new(e.home_score, e.away_score, e.period, GameStatus::Post)
            },
            // A period end means the next period started
            (EventKind::PeriodEnd, _) => GameSnapshot::new(e.home_score, e.away_score, e.period + 1, GameStatus::In),
        })
        .collect::<Vec<_>>();
    steps.push(pool.snapshot());
    steps
}

/// Re-runs the normalizer and resolver over the stored history of a pool, and plans whatever is missing.
///
/// Only score events and settlements whose keys are not stored yet end up in the plan. Amounts of missing
/// settlements are clamped against what has actually been paid, so the pot can never be overdrawn by a resettle. The
/// plan clears any suspension, since an admin asked for the repair.
pub fn plan_resettle(
    ctx: &PoolContext,
    history: &[ScoreEvent],
    existing: &[Settlement],
) -> Result<SnapshotPlan, PlanError> {
    let pool = &ctx.pool;
    let mut state = PoolState::from_pool(pool);
    state.q1 = None;
    state.half = None;
    state.q3 = None;
    state.final_score = None;
    let mut pot = PotState::new(ctx.pot());
    let mut previous = GameSnapshot::pre_game();
    let mut events = Vec::new();
    let mut settlements = Vec::new();
    for mut step in replay_steps(pool, history) {
        // Period ends filled in at the final whistle carry earlier periods than the steps before them
        step.period = step.period.max(previous.period);
        if step.same_state(previous.home_score, previous.away_score, previous.period, previous.status) {
            continue;
        }
        let step_events = normalize(&previous, &step)?;
        settlements.extend(settle_events(ctx, &step_events, &mut pot, &mut state)?);
        events.extend(step_events);
        previous = step;
    }
    let stored_events =
        history.iter().map(|e| (e.checkpoint, e.home_score, e.away_score)).collect::<HashSet<(Checkpoint, i64, i64)>>();
    events.retain(|e| !stored_events.contains(&(e.checkpoint, e.home_score, e.away_score)));
    let stored = existing.iter().map(|s| (s.checkpoint, s.home_score, s.away_score)).collect::<HashSet<_>>();
    settlements.retain(|s| !stored.contains(&(s.checkpoint, s.home_score, s.away_score)));
    let mut available = (ctx.pot() - ctx.distributed).clamp_to(ctx.pot());
    for s in settlements.iter_mut().filter(|s| s.outcome == SettlementOutcome::Paid) {
        s.amount = s.amount.clamp_to(available);
        available -= s.amount;
    }
    let stored_scores = pool.scores();
    state.q1 = state.q1.or(stored_scores.q1);
    state.half = state.half.or(stored_scores.half);
    state.q3 = state.q3.or(stored_scores.q3);
    state.final_score = state.final_score.or(stored_scores.final_score);
    state.rollover_pot = pot.rollover;
    state.last_digits = pot.last_digits;
    state.suspended = false;
    state.suspended_reason = None;
    let audit = NewAuditEvent::info(
        AuditType::Resettle,
        format!(
            "Resettled from {} stored score events. {} missing events and {} missing checkpoints recorded.",
            history.len(),
            events.len(),
            settlements.len()
        ),
    )
    .with_payload(json!({
        "storedEvents": history.len(),
        "missingEvents": events.len(),
        "missingSettlements": settlements.len(),
    }));
    Ok(SnapshotPlan {
        pool_id: pool.id,
        expected_version: pool.version,
        events,
        settlements,
        audits: vec![audit],
        state,
    })
}
