use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, Type};
use sqp_common::{Cents, GameSnapshot, GameStatus};
use thiserror::Error;

use crate::{
    axis::AxisNumbers,
    rules::{PayoutTable, RuleConfig},
};

pub const GRID_SIZE: usize = 100;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

//--------------------------------------     FeedStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    #[default]
    Healthy,
    /// The last poll cycle exhausted its retries. Scores shown for the pool may be stale.
    Degraded,
}

impl Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Healthy => write!(f, "healthy"),
            FeedStatus::Degraded => write!(f, "degraded"),
        }
    }
}

//--------------------------------------      Severity        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

//--------------------------------------      AuditType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditType {
    FeedFetchSuccess,
    FeedFetchFail,
    Settlement,
    SyncError,
    Simulation,
    AxisAssigned,
    Reset,
    Resettle,
    Suspended,
    Resumed,
}

impl Display for AuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditType::FeedFetchSuccess => "FEED_FETCH_SUCCESS",
            AuditType::FeedFetchFail => "FEED_FETCH_FAIL",
            AuditType::Settlement => "SETTLEMENT",
            AuditType::SyncError => "SYNC_ERROR",
            AuditType::Simulation => "SIMULATION",
            AuditType::AxisAssigned => "AXIS_ASSIGNED",
            AuditType::Reset => "RESET",
            AuditType::Resettle => "RESETTLE",
            AuditType::Suspended => "SUSPENDED",
            AuditType::Resumed => "RESUMED",
        };
        f.write_str(s)
    }
}

//--------------------------------------      EventKind       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum EventKind {
    /// At least one team's score changed.
    ScoreChange,
    /// A checkpoint period ended. Emitted even if nobody scored.
    PeriodEnd,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::ScoreChange => write!(f, "ScoreChange"),
            EventKind::PeriodEnd => write!(f, "PeriodEnd"),
        }
    }
}

//--------------------------------------      Checkpoint      ---------------------------------------------------------
/// The label of a point in the game at which a square can win.
///
/// `Q1`, `HALF`, `Q3` and `FINAL` mark period ends. `P1`..`P4` and `OT` label score changes inside a period, and only
/// pay out when every score pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Checkpoint {
    Q1,
    Half,
    Q3,
    Final,
    P1,
    P2,
    P3,
    P4,
    Ot,
}

impl Checkpoint {
    /// The checkpoint that fires when `period` ends, if any. The end of the fourth period is not a checkpoint on its
    /// own: `FINAL` is only emitted once the game is over.
    pub fn period_end(period: i64) -> Option<Self> {
        match period {
            1 => Some(Self::Q1),
            2 => Some(Self::Half),
            3 => Some(Self::Q3),
            _ => None,
        }
    }

    pub fn score_change(period: i64) -> Self {
        match period {
            i64::MIN..=1 => Self::P1,
            2 => Self::P2,
            3 => Self::P3,
            4 => Self::P4,
            _ => Self::Ot,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Q1 | Self::Half | Self::Q3 | Self::Final => EventKind::PeriodEnd,
            _ => EventKind::ScoreChange,
        }
    }

    /// Zero-based quarter index, used to pick the axis set when numbers change every quarter.
    pub fn quarter_index(&self) -> usize {
        match self {
            Self::Q1 | Self::P1 => 0,
            Self::Half | Self::P2 => 1,
            Self::Q3 | Self::P3 => 2,
            Self::Final | Self::P4 | Self::Ot => 3,
        }
    }
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Q1 => "Q1",
            Self::Half => "HALF",
            Self::Q3 => "Q3",
            Self::Final => "FINAL",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::Ot => "OT",
        };
        f.write_str(s)
    }
}

impl FromStr for Checkpoint {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "Q1" => Ok(Self::Q1),
            "HALF" => Ok(Self::Half),
            "Q3" => Ok(Self::Q3),
            "FINAL" => Ok(Self::Final),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            "OT" => Ok(Self::Ot),
            _ => Err(ConversionError { kind: "checkpoint", value: s.to_string() }),
        }
    }
}

//--------------------------------------  SettlementOutcome   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// The square is owned and its owner was paid.
    Paid,
    /// The square is unowned and the amount stays in the pot.
    Unclaimed,
    /// The square is unowned and the amount carries over to the next checkpoint.
    RolledOver,
    /// The digit pair matched the previous score-change checkpoint, so nothing is paid.
    Repeat,
}

impl Display for SettlementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementOutcome::Paid => write!(f, "Paid"),
            SettlementOutcome::Unclaimed => write!(f, "Unclaimed"),
            SettlementOutcome::RolledOver => write!(f, "RolledOver"),
            SettlementOutcome::Repeat => write!(f, "Repeat"),
        }
    }
}

impl From<String> for SettlementOutcome {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Paid" => Self::Paid,
            "RolledOver" => Self::RolledOver,
            "Repeat" => Self::Repeat,
            "Unclaimed" => Self::Unclaimed,
            _ => {
                error!("Invalid settlement outcome: {value}. Defaulting to Unclaimed");
                Self::Unclaimed
            },
        }
    }
}

//--------------------------------------      ScorePair       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: i64,
    pub away: i64,
}

impl ScorePair {
    pub fn new(home: i64, away: i64) -> Self {
        Self { home, away }
    }

    fn from_columns(home: Option<i64>, away: Option<i64>) -> Option<Self> {
        home.zip(away).map(|(home, away)| Self { home, away })
    }
}

impl Display for ScorePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

//--------------------------------------         Pool         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pool {
    pub id: i64,
    pub name: String,
    pub external_game_id: Option<String>,
    pub cost_per_square: Cents,
    pub every_score_pays: bool,
    pub quarterly_rollover: bool,
    pub reverse_winners: bool,
    pub number_sets: i64,
    pub payout_q1: i64,
    pub payout_half: i64,
    pub payout_q3: i64,
    pub payout_final: i64,
    pub payout_per_score: i64,
    pub is_locked: bool,
    pub game_status: GameStatus,
    pub period: i64,
    pub clock: Option<String>,
    pub home_score: i64,
    pub away_score: i64,
    pub q1_home: Option<i64>,
    pub q1_away: Option<i64>,
    pub half_home: Option<i64>,
    pub half_away: Option<i64>,
    pub q3_home: Option<i64>,
    pub q3_away: Option<i64>,
    pub final_home: Option<i64>,
    pub final_away: Option<i64>,
    /// Unclaimed checkpoint money waiting for the next owned square.
    pub rollover_pot: Cents,
    pub last_home_digit: Option<i64>,
    pub last_away_digit: Option<i64>,
    pub feed_status: FeedStatus,
    pub suspended: bool,
    pub suspended_reason: Option<String>,
    /// Bumped on every write to the pool row. Writers must present the version they read.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pool {
    pub fn rules(&self) -> RuleConfig {
        RuleConfig {
            every_score_pays: self.every_score_pays,
            quarterly_rollover: self.quarterly_rollover,
            reverse_winners: self.reverse_winners,
            number_sets: self.number_sets,
            payouts: PayoutTable {
                q1: self.payout_q1,
                half: self.payout_half,
                q3: self.payout_q3,
                final_score: self.payout_final,
                per_score: self.payout_per_score,
            },
        }
    }

    /// The stored game state, in the same shape the feed reports it.
    pub fn snapshot(&self) -> GameSnapshot {
        let mut snapshot = GameSnapshot::new(self.home_score, self.away_score, self.period, self.game_status);
        snapshot.clock = self.clock.clone();
        snapshot
    }

    pub fn last_digits(&self) -> Option<(u8, u8)> {
        let h = u8::try_from(self.last_home_digit?).ok()?;
        let a = u8::try_from(self.last_away_digit?).ok()?;
        Some((h, a))
    }

    /// True if the poller should be watching this pool.
    pub fn is_pollable(&self) -> bool {
        self.external_game_id.as_deref().is_some_and(|s| !s.trim().is_empty()) &&
            self.game_status != GameStatus::Post &&
            !self.suspended
    }

    pub fn scores(&self) -> PoolScores {
        PoolScores {
            pool_id: self.id,
            current: ScorePair::new(self.home_score, self.away_score),
            q1: ScorePair::from_columns(self.q1_home, self.q1_away),
            half: ScorePair::from_columns(self.half_home, self.half_away),
            q3: ScorePair::from_columns(self.q3_home, self.q3_away),
            final_score: ScorePair::from_columns(self.final_home, self.final_away),
            game_status: self.game_status,
            period: self.period,
            clock: self.clock.clone(),
            is_locked: self.is_locked,
            feed_status: self.feed_status,
            suspended: self.suspended,
            suspended_reason: self.suspended_reason.clone(),
            rollover_pot: self.rollover_pot,
            updated_at: self.updated_at,
        }
    }
}

//--------------------------------------      PoolScores      ---------------------------------------------------------
/// The read model of a pool's score state. A stalled pool still shows its last known score, alongside the feed and
/// suspension flags that explain why it is stalled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolScores {
    pub pool_id: i64,
    pub current: ScorePair,
    pub q1: Option<ScorePair>,
    pub half: Option<ScorePair>,
    pub q3: Option<ScorePair>,
    #[serde(rename = "final")]
    pub final_score: Option<ScorePair>,
    pub game_status: GameStatus,
    pub period: i64,
    pub clock: Option<String>,
    pub is_locked: bool,
    pub feed_status: FeedStatus,
    pub suspended: bool,
    pub suspended_reason: Option<String>,
    pub rollover_pot: Cents,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewPool        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPool {
    pub name: String,
    pub external_game_id: Option<String>,
    pub cost_per_square: Cents,
    pub rules: RuleConfig,
}

impl NewPool {
    pub fn new<S: Into<String>>(name: S, cost_per_square: Cents) -> Self {
        Self { name: name.into(), external_game_id: None, cost_per_square, rules: RuleConfig::default() }
    }

    pub fn with_game_id<S: Into<String>>(mut self, game_id: S) -> Self {
        self.external_game_id = Some(game_id.into());
        self
    }

    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }
}

//--------------------------------------        Square        ---------------------------------------------------------
/// A claimed grid cell. Unclaimed cells have no row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Square {
    pub pool_id: i64,
    pub position: i64,
    pub owner: String,
    pub paid: bool,
}

/// The 10x10 ownership grid of a pool.
#[derive(Debug, Clone, Default)]
pub struct SquareGrid {
    owners: Vec<Option<String>>,
}

impl SquareGrid {
    pub fn from_squares(squares: &[Square]) -> Self {
        let mut owners = vec![None; GRID_SIZE];
        for sq in squares {
            match usize::try_from(sq.position).ok().filter(|p| *p < GRID_SIZE) {
                Some(p) => owners[p] = Some(sq.owner.clone()),
                None => error!("Square position {} in pool {} is off the grid. Ignoring it.", sq.position, sq.pool_id),
            }
        }
        Self { owners }
    }

    pub fn owner_of(&self, square: u8) -> Option<&str> {
        self.owners.get(usize::from(square)).and_then(|o| o.as_deref())
    }

    pub fn filled(&self) -> i64 {
        self.owners.iter().filter(|o| o.is_some()).count() as i64
    }
}

//--------------------------------------      ScoreEvent      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub id: i64,
    pub pool_id: i64,
    pub kind: EventKind,
    pub checkpoint: Checkpoint,
    pub home_score: i64,
    pub away_score: i64,
    pub period: i64,
    pub clock: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A score event that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewScoreEvent {
    pub kind: EventKind,
    pub checkpoint: Checkpoint,
    pub home_score: i64,
    pub away_score: i64,
    pub period: i64,
    pub clock: Option<String>,
    pub description: String,
}

impl NewScoreEvent {
    pub fn score(&self) -> ScorePair {
        ScorePair::new(self.home_score, self.away_score)
    }
}

//--------------------------------------      Settlement      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Settlement {
    pub id: i64,
    pub pool_id: i64,
    pub checkpoint: Checkpoint,
    pub home_score: i64,
    pub away_score: i64,
    pub home_digit: i64,
    pub away_digit: i64,
    pub square: i64,
    pub owner: Option<String>,
    pub outcome: SettlementOutcome,
    pub amount: Cents,
    pub rollover_in: Cents,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSettlement {
    pub checkpoint: Checkpoint,
    pub home_score: i64,
    pub away_score: i64,
    pub home_digit: u8,
    pub away_digit: u8,
    pub square: u8,
    pub owner: Option<String>,
    pub outcome: SettlementOutcome,
    pub amount: Cents,
    /// The rolled-over amount that was available to this checkpoint.
    pub rollover_in: Cents,
    pub description: String,
}

impl NewSettlement {
    pub fn same_key(&self, checkpoint: Checkpoint, home: i64, away: i64) -> bool {
        self.checkpoint == checkpoint && self.home_score == home && self.away_score == away
    }

    /// The audit entry that accompanies this settlement. Repeats are not audited.
    pub fn audit_event(&self) -> Option<NewAuditEvent> {
        let cp = self.checkpoint;
        let score = format!("{}-{}", self.home_score, self.away_score);
        let message = match self.outcome {
            SettlementOutcome::Paid => format!(
                "{cp} winner: {} wins {} on square {:02} ({score})",
                self.owner.as_deref().unwrap_or_default(),
                self.amount,
                self.square
            ),
            SettlementOutcome::Unclaimed => format!("{cp} square {:02} is unowned ({score}). Nothing paid.", self.square),
            SettlementOutcome::RolledOver => {
                format!("{cp} square {:02} is unowned ({score}). The payout rolls over.", self.square)
            },
            SettlementOutcome::Repeat => return None,
        };
        let payload = serde_json::json!({
            "checkpoint": cp,
            "homeScore": self.home_score,
            "awayScore": self.away_score,
            "homeDigit": self.home_digit,
            "awayDigit": self.away_digit,
            "square": self.square,
            "owner": self.owner,
            "outcome": self.outcome,
            "amount": self.amount,
        });
        Some(NewAuditEvent::info(AuditType::Settlement, message).with_payload(payload))
    }
}

//--------------------------------------        Winner        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Winner {
    pub id: i64,
    pub pool_id: i64,
    pub settlement_id: i64,
    /// The checkpoint that produced this winner.
    pub period: Checkpoint,
    pub home_digit: i64,
    pub away_digit: i64,
    pub square: i64,
    pub owner: String,
    pub amount: Cents,
    pub description: String,
    pub home_score: i64,
    pub away_score: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      AuditEvent      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: i64,
    pub pool_id: i64,
    pub event_type: AuditType,
    pub severity: Severity,
    pub message: String,
    /// JSON-encoded context for the entry
    pub payload: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn payload_json(&self) -> Option<Value> {
        self.payload.as_deref().and_then(|p| serde_json::from_str(p).ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEvent {
    pub event_type: AuditType,
    pub severity: Severity,
    pub message: String,
    pub payload: Option<Value>,
}

impl NewAuditEvent {
    pub fn new<S: Into<String>>(event_type: AuditType, severity: Severity, message: S) -> Self {
        Self { event_type, severity, message: message.into(), payload: None }
    }

    pub fn info<S: Into<String>>(event_type: AuditType, message: S) -> Self {
        Self::new(event_type, Severity::Info, message)
    }

    pub fn warning<S: Into<String>>(event_type: AuditType, message: S) -> Self {
        Self::new(event_type, Severity::Warning, message)
    }

    pub fn error<S: Into<String>>(event_type: AuditType, message: S) -> Self {
        Self::new(event_type, Severity::Error, message)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

//--------------------------------------     PoolContext      ---------------------------------------------------------
/// Everything the settlement pipeline needs to know about a pool, read in one consistent view.
#[derive(Debug, Clone)]
pub struct PoolContext {
    pub pool: Pool,
    pub squares: Vec<Square>,
    pub axis: Option<AxisNumbers>,
    /// The sum of all amounts already paid out for the pool.
    pub distributed: Cents,
}

impl PoolContext {
    pub fn grid(&self) -> SquareGrid {
        SquareGrid::from_squares(&self.squares)
    }

    /// The total pot: the square price times the number of claimed squares.
    pub fn pot(&self) -> Cents {
        self.pool.cost_per_square * self.grid().filled()
    }
}
