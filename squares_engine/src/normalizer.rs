//! Turns a pair of game snapshots into the ordered list of score events that happened between them.
//!
//! The normalizer is pure. It does not know about pools or storage; the caller hands it the last stored state and the
//! new snapshot. Replaying a snapshot is safe because the events it produces carry their checkpoint and score, and the
//! storage layer keys score events on exactly that.
use sqp_common::{GameSnapshot, GameStatus};
use thiserror::Error;

use crate::db_types::{Checkpoint, EventKind, NewScoreEvent};

pub const FALLBACK_LABEL: &str = "Score Change";
/// Only periods 1-3 end with a checkpoint of their own. The end of the game is `FINAL`.
const LAST_CHECKPOINT_PERIOD: i64 = 3;

/// Points scored in a single snapshot, and what to call them.
const SCORE_LABELS: [(i64, &str); 6] = [
    (1, "Extra Point"),
    (2, "Safety"),
    (3, "Field Goal"),
    (6, "Touchdown"),
    (7, "Touchdown + PAT"),
    (8, "Touchdown + 2PT"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("The score went backwards, from {from_home}-{from_away} to {to_home}-{to_away}")]
    ScoreRegression { from_home: i64, from_away: i64, to_home: i64, to_away: i64 },
    #[error("The period went backwards, from {from} to {to}")]
    PeriodRegression { from: i64, to: i64 },
    #[error("The game status cannot move from {from} to {to}")]
    StatusRegression { from: GameStatus, to: GameStatus },
}

pub fn score_label(points: i64) -> &'static str {
    SCORE_LABELS.iter().find(|(p, _)| *p == points).map(|(_, label)| *label).unwrap_or(FALLBACK_LABEL)
}

pub fn describe_score_change(d_home: i64, d_away: i64) -> String {
    match (d_home > 0, d_away > 0) {
        (true, false) => format!("Home {}", score_label(d_home)),
        (false, true) => format!("Away {}", score_label(d_away)),
        _ => format!("Home {}, Away {}", score_label(d_home), score_label(d_away)),
    }
}

fn describe_period_end(checkpoint: Checkpoint) -> String {
    match checkpoint {
        Checkpoint::Q1 => "End of Q1".to_string(),
        Checkpoint::Half => "Halftime".to_string(),
        Checkpoint::Q3 => "End of Q3".to_string(),
        Checkpoint::Final => "Final".to_string(),
        other => format!("End of {other}"),
    }
}

fn period_end(checkpoint: Checkpoint, home: i64, away: i64, period: i64) -> NewScoreEvent {
    NewScoreEvent {
        kind: EventKind::PeriodEnd,
        checkpoint,
        home_score: home,
        away_score: away,
        period,
        clock: Some("0:00".to_string()),
        description: describe_period_end(checkpoint),
    }
}

/// Derives the score events between `previous` (the last stored state) and `next`.
///
/// Events are returned in evaluation order:
/// 1. a period end for every checkpoint period that ended, at the score last recorded inside that period,
/// 2. the score change, if either team scored,
/// 3. when the game has just ended, any regulation period ends that never fired, then `FINAL`.
///
/// A snapshot that only changes the clock or the status produces no events.
pub fn normalize(previous: &GameSnapshot, next: &GameSnapshot) -> Result<Vec<NewScoreEvent>, SyncError> {
    if next.home_score < previous.home_score || next.away_score < previous.away_score {
        return Err(SyncError::ScoreRegression {
            from_home: previous.home_score,
            from_away: previous.away_score,
            to_home: next.home_score,
            to_away: next.away_score,
        });
    }
    if next.period < previous.period {
        return Err(SyncError::PeriodRegression { from: previous.period, to: next.period });
    }
    if next.status < previous.status {
        return Err(SyncError::StatusRegression { from: previous.status, to: next.status });
    }
    let mut events = Vec::new();
    for ended in previous.period.max(1)..next.period.min(LAST_CHECKPOINT_PERIOD + 1) {
        if let Some(cp) = Checkpoint::period_end(ended) {
            events.push(period_end(cp, previous.home_score, previous.away_score, ended));
        }
    }
    let d_home = next.home_score - previous.home_score;
    let d_away = next.away_score - previous.away_score;
    let period = next.period.max(1);
    if d_home > 0 || d_away > 0 {
        events.push(NewScoreEvent {
            kind: EventKind::ScoreChange,
            checkpoint: Checkpoint::score_change(period),
            home_score: next.home_score,
            away_score: next.away_score,
            period,
            clock: next.clock.clone(),
            description: describe_score_change(d_home, d_away),
        });
    }
    if next.status == GameStatus::Post && previous.status != GameStatus::Post {
        for missing in period..=LAST_CHECKPOINT_PERIOD {
            if let Some(cp) = Checkpoint::period_end(missing) {
                events.push(period_end(cp, next.home_score, next.away_score, missing));
            }
        }
        events.push(period_end(Checkpoint::Final, next.home_score, next.away_score, period));
    }
    Ok(events)
}
