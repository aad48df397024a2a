//! Axis numbers: the digit permutations printed along the edges of the grid.
//!
//! Numbers are drawn once, when the pool locks. The storage layer refuses to replace them afterwards.
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::rules::RuleError;

pub const DIGITS: usize = 10;

//--------------------------------------       AxisSet        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSet {
    pub home: [u8; DIGITS],
    pub away: [u8; DIGITS],
}

impl AxisSet {
    pub fn new(home: [u8; DIGITS], away: [u8; DIGITS]) -> Result<Self, RuleError> {
        let set = Self { home, away };
        set.validate()?;
        Ok(set)
    }

    /// Draws a uniformly random permutation for each axis.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut home: [u8; DIGITS] = std::array::from_fn(|i| i as u8);
        let mut away = home;
        home.shuffle(rng);
        away.shuffle(rng);
        Self { home, away }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        check_permutation("home", &self.home)?;
        check_permutation("away", &self.away)
    }

    /// Parses the compact storage form, e.g. `"5038192647"`.
    pub fn from_digit_strings(home: &str, away: &str) -> Result<Self, RuleError> {
        Self::new(parse_digits("home", home)?, parse_digits("away", away)?)
    }

    pub fn home_digits(&self) -> String {
        digit_string(&self.home)
    }

    pub fn away_digits(&self) -> String {
        digit_string(&self.away)
    }
}

fn digit_string(digits: &[u8; DIGITS]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

fn parse_digits(side: &str, s: &str) -> Result<[u8; DIGITS], RuleError> {
    let digits = s
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| RuleError::InvalidAxis(format!("{side} axis '{s}' contains non-digits")))?;
    <[u8; DIGITS]>::try_from(digits)
        .map_err(|d| RuleError::InvalidAxis(format!("{side} axis has {} digits, expected {DIGITS}", d.len())))
}

fn check_permutation(side: &str, digits: &[u8; DIGITS]) -> Result<(), RuleError> {
    let mut seen = [false; DIGITS];
    for &d in digits {
        let slot = seen
            .get_mut(usize::from(d))
            .ok_or_else(|| RuleError::InvalidAxis(format!("{side} axis contains {d}, which is not a digit")))?;
        if *slot {
            return Err(RuleError::InvalidAxis(format!("{side} axis contains {d} more than once")));
        }
        *slot = true;
    }
    Ok(())
}

//--------------------------------------     AxisNumbers      ---------------------------------------------------------
/// All the axis sets of a pool: one for the whole game, or one per quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisNumbers(Vec<AxisSet>);

impl AxisNumbers {
    pub fn new(sets: Vec<AxisSet>) -> Self {
        Self(sets)
    }

    pub fn generate<R: Rng + ?Sized>(number_sets: i64, rng: &mut R) -> Self {
        let n = usize::try_from(number_sets).unwrap_or(1).max(1);
        Self((0..n).map(|_| AxisSet::random(rng)).collect())
    }

    pub fn sets(&self) -> &[AxisSet] {
        &self.0
    }

    pub fn set(&self, index: usize) -> Option<&AxisSet> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
