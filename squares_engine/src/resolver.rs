//! Winner resolution.
//!
//! Everything in here is a pure function of its inputs. Given a score event, the pool rules, the axis numbers, the
//! ownership grid and the running pot state, [`resolve`] decides whether the event is a checkpoint and, if so, which
//! square it lands on and how much that square is owed.
use serde::Serialize;
use sqp_common::Cents;

use crate::{
    axis::{AxisNumbers, AxisSet},
    db_types::{EventKind, NewScoreEvent, NewSettlement, SettlementOutcome, SquareGrid},
    rules::{RuleConfig, RuleError},
};

//--------------------------------------      Coordinate      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coordinate {
    pub home_digit: u8,
    pub away_digit: u8,
}

impl Coordinate {
    pub fn square(&self) -> u8 {
        self.home_digit * 10 + self.away_digit
    }

    pub fn digits(&self) -> (u8, u8) {
        (self.home_digit, self.away_digit)
    }
}

fn last_digit(score: i64) -> usize {
    score.rem_euclid(10) as usize
}

/// Maps a score onto the grid.
///
/// Normally the home axis is indexed by the home score and the away axis by the away score. With reversed winners the
/// scores swap axes, so `locate(7, 3, reversed) == locate(3, 7, normal)`.
pub fn locate(axis: &AxisSet, home_score: i64, away_score: i64, reverse: bool) -> Coordinate {
    let (home_index, away_index) =
        if reverse { (last_digit(away_score), last_digit(home_score)) } else { (last_digit(home_score), last_digit(away_score)) };
    Coordinate { home_digit: axis.home[home_index], away_digit: axis.away[away_index] }
}

//--------------------------------------       PotState       ---------------------------------------------------------
/// The money side of the pool, threaded through consecutive resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PotState {
    pub pot: Cents,
    /// Already paid out, across all checkpoints.
    pub distributed: Cents,
    /// Carried forward from unowned squares under quarterly rollover.
    pub rollover: Cents,
    /// Digits of the last resolved score-change checkpoint.
    pub last_digits: Option<(u8, u8)>,
}

impl PotState {
    pub fn new(pot: Cents) -> Self {
        Self { pot, ..Default::default() }
    }

    pub fn remaining(&self) -> Cents {
        (self.pot - self.distributed).clamp_to(self.pot)
    }

    /// Moves the state past a resolution.
    pub fn advance(&mut self, resolution: &Resolution) {
        if resolution.outcome == SettlementOutcome::Paid {
            self.distributed += resolution.amount;
        }
        self.rollover = resolution.rollover_out;
        if resolution.kind == EventKind::ScoreChange && resolution.outcome != SettlementOutcome::Repeat {
            self.last_digits = Some(resolution.coordinate.digits());
        }
    }
}

//--------------------------------------      Resolution      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub kind: EventKind,
    pub coordinate: Coordinate,
    pub owner: Option<String>,
    pub outcome: SettlementOutcome,
    pub amount: Cents,
    pub rollover_in: Cents,
    pub rollover_out: Cents,
}

impl Resolution {
    pub fn to_settlement(&self, event: &NewScoreEvent) -> NewSettlement {
        NewSettlement {
            checkpoint: event.checkpoint,
            home_score: event.home_score,
            away_score: event.away_score,
            home_digit: self.coordinate.home_digit,
            away_digit: self.coordinate.away_digit,
            square: self.coordinate.square(),
            owner: self.owner.clone(),
            outcome: self.outcome,
            amount: self.amount,
            rollover_in: self.rollover_in,
            description: event.description.clone(),
        }
    }
}

/// Resolves a single score event. Returns `None` if the event is not a checkpoint under the given rules.
///
/// Repeated digit pairs only apply between consecutive score changes: a score change that lands on the same digits as
/// the previous resolved score change does not pay again. Period ends always resolve.
pub fn resolve(
    event: &NewScoreEvent,
    rules: &RuleConfig,
    axis: Option<&AxisNumbers>,
    grid: &SquareGrid,
    state: &PotState,
) -> Result<Option<Resolution>, RuleError> {
    if !rules.is_checkpoint(event.checkpoint) {
        return Ok(None);
    }
    let axis = axis.ok_or(RuleError::MissingAxisNumbers)?;
    rules.validate_axis(axis)?;
    let index = rules.axis_set_index(event.checkpoint);
    let set = axis.set(index).ok_or(RuleError::AxisSetCount { expected: rules.number_sets, found: axis.len() })?;
    let coordinate = locate(set, event.home_score, event.away_score, rules.reverse_winners);
    let owner = grid.owner_of(coordinate.square()).map(String::from);
    let kind = event.kind;
    if kind == EventKind::ScoreChange && state.last_digits == Some(coordinate.digits()) {
        return Ok(Some(Resolution {
            kind,
            coordinate,
            owner,
            outcome: SettlementOutcome::Repeat,
            amount: Cents::default(),
            rollover_in: state.rollover,
            rollover_out: state.rollover,
        }));
    }
    let share = state.pot.basis_points(rules.payouts.for_checkpoint(event.checkpoint));
    let gross = share + state.rollover;
    let remaining = state.remaining();
    let resolution = match owner {
        Some(_) => Resolution {
            kind,
            coordinate,
            owner,
            outcome: SettlementOutcome::Paid,
            amount: gross.clamp_to(remaining),
            rollover_in: state.rollover,
            rollover_out: Cents::default(),
        },
        None if rules.quarterly_rollover => Resolution {
            kind,
            coordinate,
            owner,
            outcome: SettlementOutcome::RolledOver,
            amount: Cents::default(),
            rollover_in: state.rollover,
            rollover_out: gross.clamp_to(remaining),
        },
        None => Resolution {
            kind,
            coordinate,
            owner,
            outcome: SettlementOutcome::Unclaimed,
            amount: Cents::default(),
            rollover_in: state.rollover,
            rollover_out: Cents::default(),
        },
    };
    Ok(Some(resolution))
}

#[cfg(test)]
mod test {
    use sqp_common::Cents;

    use super::*;
    use crate::{
        db_types::{Checkpoint, Square},
        rules::PayoutTable,
    };

    const HOME: [u8; 10] = [5, 0, 3, 8, 1, 9, 2, 6, 4, 7];
    const AWAY: [u8; 10] = [2, 9, 4, 0, 6, 1, 8, 3, 5, 7];

    fn axis() -> AxisNumbers {
        AxisNumbers::new(vec![AxisSet::new(HOME, AWAY).unwrap()])
    }

    fn grid(owned: &[(i64, &str)]) -> SquareGrid {
        let squares = owned
            .iter()
            .map(|(p, o)| Square { pool_id: 1, position: *p, owner: o.to_string(), paid: true })
            .collect::<Vec<_>>();
        SquareGrid::from_squares(&squares)
    }

    fn event(checkpoint: Checkpoint, home: i64, away: i64) -> NewScoreEvent {
        NewScoreEvent {
            kind: checkpoint.kind(),
            checkpoint,
            home_score: home,
            away_score: away,
            period: 1,
            clock: None,
            description: "test".into(),
        }
    }

    #[test]
    fn scenario_grid() {
        let axis = axis();
        let c = locate(&axis.sets()[0], 7, 3, false);
        assert_eq!(c, Coordinate { home_digit: 6, away_digit: 0 });
        assert_eq!(c.square(), 60);
        let grid = grid(&[(60, "alice")]);
        let state = PotState::new(Cents::from(10_000));
        let r = resolve(&event(Checkpoint::Q1, 7, 3), &RuleConfig::default(), Some(&axis), &grid, &state)
            .unwrap()
            .unwrap();
        assert_eq!(r.outcome, SettlementOutcome::Paid);
        assert_eq!(r.owner.as_deref(), Some("alice"));
        assert_eq!(r.amount, Cents::from(2_000));
    }

    #[test]
    fn reversal_symmetry() {
        let axis = axis();
        let set = &axis.sets()[0];
        for home in 0..30 {
            for away in 0..30 {
                assert_eq!(locate(set, home, away, true), locate(set, away, home, false));
            }
        }
    }

    #[test]
    fn resolution_is_pure() {
        let axis = axis();
        let grid = grid(&[(60, "alice"), (12, "bob")]);
        let rules = RuleConfig { every_score_pays: true, quarterly_rollover: true, ..Default::default() };
        let state = PotState { pot: Cents::from(5_000), rollover: Cents::from(300), ..Default::default() };
        let ev = event(Checkpoint::Half, 14, 10);
        let a = resolve(&ev, &rules, Some(&axis), &grid, &state);
        let b = resolve(&ev, &rules, Some(&axis), &grid, &state);
        assert_eq!(a, b);
    }

    #[test]
    fn score_changes_are_not_checkpoints_by_default() {
        let state = PotState::new(Cents::from(10_000));
        let r = resolve(&event(Checkpoint::P1, 7, 0), &RuleConfig::default(), None, &grid(&[]), &state).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn missing_axis_is_a_configuration_error() {
        let state = PotState::new(Cents::from(10_000));
        let err = resolve(&event(Checkpoint::Q1, 7, 0), &RuleConfig::default(), None, &grid(&[]), &state);
        assert_eq!(err, Err(RuleError::MissingAxisNumbers));
    }

    #[test]
    fn unowned_square_without_rollover() {
        let state = PotState::new(Cents::from(10_000));
        let r = resolve(&event(Checkpoint::Q1, 7, 3), &RuleConfig::default(), Some(&axis()), &grid(&[]), &state)
            .unwrap()
            .unwrap();
        assert_eq!(r.outcome, SettlementOutcome::Unclaimed);
        assert_eq!(r.amount, Cents::from(0));
        assert_eq!(r.rollover_out, Cents::from(0));
    }

    #[test]
    fn rollover_adds_to_the_next_checkpoint() {
        let axis = axis();
        // 7-3 -> square 60 (unowned). 14-10 -> home[4]=1, away[0]=2 -> square 12
        let grid = grid(&[(12, "bob")]);
        let rules = RuleConfig { quarterly_rollover: true, ..Default::default() };
        let mut state = PotState::new(Cents::from(10_000));
        let q1 = resolve(&event(Checkpoint::Q1, 7, 3), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(q1.outcome, SettlementOutcome::RolledOver);
        assert_eq!(q1.rollover_out, Cents::from(2_000));
        state.advance(&q1);
        let half = resolve(&event(Checkpoint::Half, 14, 10), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(half.outcome, SettlementOutcome::Paid);
        assert_eq!(half.owner.as_deref(), Some("bob"));
        assert_eq!(half.amount, Cents::from(5_000));
        assert_eq!(half.rollover_in, Cents::from(2_000));
        state.advance(&half);
        assert_eq!(state.rollover, Cents::from(0));
        assert_eq!(state.distributed, Cents::from(5_000));
    }

    #[test]
    fn pay_once_per_distinct_digit_pair_transition() {
        let axis = axis();
        let grid = grid(&[(60, "alice")]);
        let payouts = PayoutTable { per_score: 500, ..Default::default() };
        let rules = RuleConfig { every_score_pays: true, payouts, ..Default::default() };
        let mut state = PotState::new(Cents::from(10_000));
        let first = resolve(&event(Checkpoint::P1, 7, 3), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(first.outcome, SettlementOutcome::Paid);
        assert_eq!(first.amount, Cents::from(500));
        state.advance(&first);
        // 17-13 maps to the same digits
        let repeat = resolve(&event(Checkpoint::P2, 17, 13), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(repeat.outcome, SettlementOutcome::Repeat);
        assert_eq!(repeat.amount, Cents::from(0));
        state.advance(&repeat);
        // Period ends still pay at the same digits
        let half = resolve(&event(Checkpoint::Half, 17, 13), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(half.outcome, SettlementOutcome::Paid);
        assert_eq!(half.amount, Cents::from(3_000));
    }

    #[test]
    fn payouts_never_exceed_the_pot() {
        let axis = axis();
        let grid = grid(&[(60, "alice")]);
        let payouts = PayoutTable { per_score: 9_000, ..Default::default() };
        let rules = RuleConfig { every_score_pays: true, payouts, ..Default::default() };
        let state = PotState { pot: Cents::from(1_000), distributed: Cents::from(800), ..Default::default() };
        let r = resolve(&event(Checkpoint::P1, 7, 3), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(r.amount, Cents::from(200));
    }

    #[test]
    fn quarterly_numbers_use_the_matching_set() {
        let first = AxisSet::new(HOME, AWAY).unwrap();
        let mut reversed_home = HOME;
        reversed_home.reverse();
        let second = AxisSet::new(reversed_home, AWAY).unwrap();
        let axis = AxisNumbers::new(vec![first, second, first, first]);
        let rules = RuleConfig { number_sets: 4, ..Default::default() };
        let state = PotState::new(Cents::from(10_000));
        let grid = grid(&[]);
        let q1 = resolve(&event(Checkpoint::Q1, 7, 3), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        let half = resolve(&event(Checkpoint::Half, 7, 3), &rules, Some(&axis), &grid, &state).unwrap().unwrap();
        assert_eq!(q1.coordinate.home_digit, 6);
        assert_eq!(half.coordinate.home_digit, reversed_home[7]);
    }
}
