//! Synthetic plays for the admin *simulate* action.
use std::fmt::Display;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use sqp_common::{GameSnapshot, GameStatus};

use crate::sqp_api::errors::SettlementError;

/// The scoring plays a random simulation picks from.
pub const RANDOM_PLAYS: [i64; 5] = [2, 3, 6, 7, 8];
const MAX_POINTS_PER_PLAY: i64 = 8;
const REGULATION_PERIODS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Home,
    Away,
}

impl Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Home => write!(f, "home"),
            Team::Away => write!(f, "away"),
        }
    }
}

/// What an admin wants to happen next in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimulationRequest {
    /// Use this exact snapshot.
    Snapshot(GameSnapshot),
    /// `team` scores `points`. Starts the game if it has not started yet.
    Score { team: Team, points: i64 },
    /// Ends the current period. Ending the 4th ends the game, unless the score is tied, in which case overtime starts.
    EndPeriod,
    /// A random team makes a random scoring play.
    RandomPlay,
}

impl SimulationRequest {
    /// Works out the snapshot that follows `current`.
    pub fn next_snapshot<R: Rng + ?Sized>(
        &self,
        current: &GameSnapshot,
        rng: &mut R,
    ) -> Result<GameSnapshot, SettlementError> {
        if current.status == GameStatus::Post {
            return Err(SettlementError::InvalidSimulation("The game is already over".into()));
        }
        match self {
            SimulationRequest::Snapshot(snapshot) => Ok(snapshot.clone()),
            SimulationRequest::Score { team, points } => score(current, *team, *points),
            SimulationRequest::EndPeriod => end_period(current),
            SimulationRequest::RandomPlay => {
                let team = if rng.gen_bool(0.5) { Team::Home } else { Team::Away };
                let points = RANDOM_PLAYS.choose(rng).copied().unwrap_or(RANDOM_PLAYS[0]);
                score(current, team, points)
            },
        }
    }
}

fn score(current: &GameSnapshot, team: Team, points: i64) -> Result<GameSnapshot, SettlementError> {
    if !(1..=MAX_POINTS_PER_PLAY).contains(&points) {
        return Err(SettlementError::InvalidSimulation(format!(
            "A single play scores between 1 and {MAX_POINTS_PER_PLAY} points, not {points}"
        )));
    }
    let mut next = current.clone();
    match team {
        Team::Home => next.home_score += points,
        Team::Away => next.away_score += points,
    }
    next.status = GameStatus::In;
    next.period = next.period.max(1);
    Ok(next)
}

fn end_period(current: &GameSnapshot) -> Result<GameSnapshot, SettlementError> {
    if current.status == GameStatus::Pre {
        return Err(SettlementError::InvalidSimulation("The game has not kicked off yet".into()));
    }
    let mut next = current.clone();
    next.clock = Some("0:00".into());
    let tied = current.home_score == current.away_score;
    match current.period {
        p if p < REGULATION_PERIODS => {
            next.period = p + 1;
            next.clock = Some("15:00".into());
        },
        REGULATION_PERIODS if tied => {
            next.period = REGULATION_PERIODS + 1;
            next.clock = Some("10:00".into());
        },
        _ => next.status = GameStatus::Post,
    }
    Ok(next)
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn scoring_starts_the_game() {
        let next = SimulationRequest::Score { team: Team::Home, points: 7 }
            .next_snapshot(&GameSnapshot::pre_game(), &mut rng())
            .unwrap();
        assert_eq!(next, GameSnapshot::new(7, 0, 1, GameStatus::In));
    }

    #[test]
    fn silly_points_are_rejected() {
        let current = GameSnapshot::new(0, 0, 1, GameStatus::In);
        for points in [0, -3, 9] {
            let err = SimulationRequest::Score { team: Team::Away, points }.next_snapshot(&current, &mut rng());
            assert!(matches!(err, Err(SettlementError::InvalidSimulation(_))));
        }
    }

    #[test]
    fn period_ends() {
        let mut rng = rng();
        let q2 = SimulationRequest::EndPeriod.next_snapshot(&GameSnapshot::new(7, 3, 1, GameStatus::In), &mut rng);
        assert_eq!(q2.unwrap().period, 2);
        let over = SimulationRequest::EndPeriod.next_snapshot(&GameSnapshot::new(7, 3, 4, GameStatus::In), &mut rng);
        assert_eq!(over.unwrap().status, GameStatus::Post);
        let ot = SimulationRequest::EndPeriod.next_snapshot(&GameSnapshot::new(10, 10, 4, GameStatus::In), &mut rng);
        let ot = ot.unwrap();
        assert_eq!((ot.period, ot.status), (5, GameStatus::In));
        let done = SimulationRequest::EndPeriod.next_snapshot(&ot, &mut rng).unwrap();
        assert_eq!(done.status, GameStatus::Post);
        assert!(SimulationRequest::EndPeriod.next_snapshot(&GameSnapshot::pre_game(), &mut rng).is_err());
        assert!(SimulationRequest::RandomPlay.next_snapshot(&done, &mut rng).is_err());
    }

    #[test]
    fn random_plays_are_real_plays() {
        let mut rng = rng();
        let mut current = GameSnapshot::new(0, 0, 1, GameStatus::In);
        for _ in 0..20 {
            let next = SimulationRequest::RandomPlay.next_snapshot(&current, &mut rng).unwrap();
            let delta = (next.home_score - current.home_score) + (next.away_score - current.away_score);
            assert!(RANDOM_PLAYS.contains(&delta));
            current = next;
        }
    }

    #[test]
    fn requests_deserialize() {
        let req: SimulationRequest = serde_json::from_str(r#"{"action":"score","team":"away","points":3}"#).unwrap();
        assert_eq!(req, SimulationRequest::Score { team: Team::Away, points: 3 });
        let req: SimulationRequest = serde_json::from_str(r#"{"action":"end_period"}"#).unwrap();
        assert_eq!(req, SimulationRequest::EndPeriod);
        let req: SimulationRequest = serde_json::from_str(
            r#"{"action":"snapshot","home_score":3,"away_score":0,"period":1,"clock":null,"status":"in"}"#,
        )
        .unwrap();
        assert_eq!(req, SimulationRequest::Snapshot(GameSnapshot::new(3, 0, 1, GameStatus::In)));
        let req: SimulationRequest =
            serde_json::from_str(r#"{"action":"snapshot","homeScore":"7","awayScore":0,"period":2,"status":"live"}"#)
                .unwrap();
        assert_eq!(req, SimulationRequest::Snapshot(GameSnapshot::new(7, 0, 2, GameStatus::In)));
    }

    #[test]
    fn snapshots_are_parsed_strictly() {
        for body in [
            r#"{"action":"snapshot","home_score":3,"away_score":0,"period":0,"status":"in"}"#,
            r#"{"action":"snapshot","home_score":3,"away_score":0,"period":11,"status":"in"}"#,
            r#"{"action":"snapshot","home_score":-3,"away_score":0,"period":1,"status":"in"}"#,
            r#"{"action":"snapshot","home_score":3,"away_score":0,"period":1}"#,
        ] {
            assert!(serde_json::from_str::<SimulationRequest>(body).is_err(), "{body}");
        }
    }
}
