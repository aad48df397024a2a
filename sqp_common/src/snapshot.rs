//! Strict representation of a single game-state observation.
//!
//! Score feeds are untrusted. Anything arriving from the outside world (a provider payload, an admin simulation
//! request) is parsed with [`GameSnapshot::from_json`], which refuses to guess: a missing or malformed critical field
//! is a [`SnapshotError`], never a default zero.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Type;
use thiserror::Error;

/// Regulation plus a generous allowance for overtime. Anything beyond this is a broken feed.
pub const MAX_PERIOD: i64 = 10;

//--------------------------------------     GameStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// The game has not started yet.
    Pre,
    /// The game is in progress.
    In,
    /// The game is over. Automated processing stops here.
    Post,
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Pre => write!(f, "pre"),
            GameStatus::In => write!(f, "in"),
            GameStatus::Post => write!(f, "post"),
        }
    }
}

impl FromStr for GameStatus {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre" | "scheduled" | "status_scheduled" => Ok(Self::Pre),
            "in" | "live" | "in_progress" | "status_in_progress" | "halftime" | "status_halftime" |
            "end_period" | "status_end_period" => Ok(Self::In),
            "post" | "final" | "status_final" => Ok(Self::Post),
            other => Err(SnapshotError::InvalidField { field: "status", reason: format!("unknown status '{other}'") }),
        }
    }
}

//--------------------------------------    SnapshotError     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("The payload is not valid JSON. {0}")]
    InvalidJson(String),
    #[error("Required field '{0}' is missing from the payload")]
    MissingField(&'static str),
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

//--------------------------------------     GameSnapshot     ---------------------------------------------------------
/// A validated observation of the game state.
///
/// Deserializing goes through [`GameSnapshot::from_json`], so the same checks apply to every JSON source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct GameSnapshot {
    pub home_score: i64,
    pub away_score: i64,
    /// The current period. 0 before kickoff, 1-4 in regulation, 5+ for overtime.
    pub period: i64,
    pub clock: Option<String>,
    pub status: GameStatus,
}

impl GameSnapshot {
    pub fn new(home_score: i64, away_score: i64, period: i64, status: GameStatus) -> Self {
        Self { home_score, away_score, period, clock: None, status }
    }

    pub fn pre_game() -> Self {
        Self::new(0, 0, 0, GameStatus::Pre)
    }

    pub fn with_clock<S: Into<String>>(mut self, clock: S) -> Self {
        self.clock = Some(clock.into());
        self
    }

    /// True if this snapshot carries the same score, period and status as the given values. The clock is ignored,
    /// since it changes constantly without affecting settlement.
    pub fn same_state(&self, home: i64, away: i64, period: i64, status: GameStatus) -> bool {
        self.home_score == home && self.away_score == away && self.period == period && self.status == status
    }

    /// Parses a raw JSON payload into a snapshot.
    ///
    /// Accepted field names are `homeScore`/`home_score`, `awayScore`/`away_score`, `period`, `clock` and `status`.
    /// Scores and period may be numbers or numeric strings (many feeds send `"7"`). `clock` is optional; everything
    /// else is required.
    pub fn from_json(value: &Value) -> Result<Self, SnapshotError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SnapshotError::InvalidJson("Expected a JSON object at the top level".to_string()))?;
        let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null());
        let status = field(&["status", "gameStatus"])
            .ok_or(SnapshotError::MissingField("status"))?
            .as_str()
            .ok_or_else(|| SnapshotError::InvalidField { field: "status", reason: "expected a string".into() })?
            .parse::<GameStatus>()?;
        let home_score = non_negative("homeScore", field(&["homeScore", "home_score"]))?;
        let away_score = non_negative("awayScore", field(&["awayScore", "away_score"]))?;
        let period = non_negative("period", field(&["period"]))?;
        if period > MAX_PERIOD {
            return Err(SnapshotError::InvalidField {
                field: "period",
                reason: format!("period {period} is beyond the last possible period ({MAX_PERIOD})"),
            });
        }
        if status != GameStatus::Pre && period == 0 {
            return Err(SnapshotError::InvalidField {
                field: "period",
                reason: format!("period 0 is only valid before kickoff, but status is '{status}'"),
            });
        }
        let clock = match field(&["clock", "displayClock"]) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => Some(v.to_string()),
        };
        Ok(Self { home_score, away_score, period, clock, status })
    }

    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let value = serde_json::from_str::<Value>(s).map_err(|e| SnapshotError::InvalidJson(e.to_string()))?;
        Self::from_json(&value)
    }
}

impl TryFrom<Value> for GameSnapshot {
    type Error = SnapshotError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn non_negative(name: &'static str, value: Option<&Value>) -> Result<i64, SnapshotError> {
    let value = value.ok_or(SnapshotError::MissingField(name))?;
    let n = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| SnapshotError::InvalidField { field: name, reason: format!("{value} is not an integer") })?;
    if n < 0 {
        return Err(SnapshotError::InvalidField { field: name, reason: format!("{n} is negative") });
    }
    Ok(n)
}
