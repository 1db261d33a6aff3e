//! Vote entity (§3 Data Model).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::{Nullifier, RumorId};

/// A voter's stance on a rumor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Choice {
    /// The rumor is believed true.
    True,
    /// The rumor is believed false.
    False,
    /// The voter cannot tell.
    Unverified,
}

impl Choice {
    /// All three choices, in a fixed order used everywhere sums need to be
    /// deterministic (scoring, consensus).
    pub const ALL: [Choice; 3] = [Choice::True, Choice::False, Choice::Unverified];
}

/// A probability distribution over [`Choice`] summing to `1.0 +/- 0.02` (I3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction(BTreeMap<Choice, f64>);

impl Prediction {
    /// Build a prediction from explicit per-choice probabilities.
    pub fn new(true_p: f64, false_p: f64, unverified_p: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Choice::True, true_p);
        map.insert(Choice::False, false_p);
        map.insert(Choice::Unverified, unverified_p);
        Prediction(map)
    }

    /// The raw (unfloored) probability for `choice`, defaulting to `0.0` if
    /// absent.
    pub fn get(&self, choice: Choice) -> f64 {
        self.0.get(&choice).copied().unwrap_or(0.0)
    }

    /// The probability for `choice`, floored at `floor` (4.F "Prediction
    /// floor").
    pub fn floored(&self, choice: Choice, floor: f64) -> f64 {
        self.get(choice).max(floor)
    }

    /// Sum of all raw probabilities, used by I3's tolerance check.
    pub fn sum(&self) -> f64 {
        Choice::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// A vote cast by one voter on one rumor; at most one per (voter, rumor)
/// pair (I1 scope = `(RumorId, "vote")`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// The rumor being voted on.
    pub rumor_id: RumorId,
    /// Nullifier of the voter.
    pub voter_nullifier: Nullifier,
    /// The voter's chosen answer.
    pub choice: Choice,
    /// The voter's full probabilistic prediction.
    pub prediction: Prediction,
    /// Stake amount, >= 1.
    pub stake_amount: u64,
    /// Gossip-supplied timestamp.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_sum_within_tolerance() {
        let p = Prediction::new(0.9, 0.05, 0.05);
        assert!((p.sum() - 1.0).abs() <= 0.02);
    }

    #[test]
    fn floored_never_below_floor() {
        let p = Prediction::new(0.0, 1.0, 0.0);
        assert_eq!(p.floored(Choice::True, 0.001), 0.001);
        assert_eq!(p.floored(Choice::False, 0.001), 1.0);
    }
}
