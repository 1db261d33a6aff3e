//! Scoring — BTS and RBTS (§4.F).
use std::collections::BTreeMap;

use rumorcast_config::Config;
use rumorcast_crypto::hash::calculate_sha256;
use rumorcast_data_structures::{Choice, Nullifier, RumorId};

use crate::dampener::DampenedVote;

/// The engine that actually ran, recorded for auditability.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Engine {
    /// Full Bayesian Truth Serum, `N >= RBTS_THRESHOLD`.
    Bts,
    /// Robust BTS with deterministic peer assignment, `3 <= N < RBTS_THRESHOLD`.
    Rbts,
    /// Fewer than 3 dampened votes: no meaningful scoring is possible.
    Neutral,
}

/// The rumor-level consensus label.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Consensus {
    /// `x̄_TRUE > 0.5`.
    True,
    /// `x̄_FALSE > 0.5`.
    False,
    /// No choice has a weighted majority.
    Disputed,
    /// No votes at all.
    Unverified,
}

/// Which two other voters a voter was compared against under RBTS.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeerAssignment {
    /// Index into the dampened-vote slice used as the reference voter.
    pub reference: usize,
    /// Index into the dampened-vote slice used as the prediction peer.
    pub peer: usize,
}

/// Output of a scoring run.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreResult {
    /// Which engine produced this result.
    pub engine: Engine,
    /// `100 * weighted TRUE stake share`, or `50` if no stake was cast.
    pub rumor_trust_score: f64,
    /// Per-voter total score; negative is a slash signal, positive a reward
    /// signal.
    pub voter_scores: BTreeMap<Nullifier, f64>,
    /// Weighted actual proportion per choice.
    pub actual_proportions: BTreeMap<Choice, f64>,
    /// The consensus label.
    pub consensus: Consensus,
    /// Present only for [`Engine::Bts`]: the weighted geometric mean
    /// prediction per choice.
    pub geometric_means: Option<BTreeMap<Choice, f64>>,
    /// Present only for [`Engine::Rbts`]: the peer assignment used for each
    /// voter, by nullifier.
    pub peer_assignments: Option<BTreeMap<Nullifier, PeerAssignment>>,
}

fn weighted_actual_proportions(votes: &[DampenedVote]) -> BTreeMap<Choice, f64> {
    let total_weight: f64 = votes.iter().map(|d| d.weight).sum();
    let mut out = BTreeMap::new();
    for choice in Choice::ALL {
        let numerator: f64 = votes
            .iter()
            .filter(|d| d.vote.choice == choice)
            .map(|d| d.weight)
            .sum();
        out.insert(choice, if total_weight > 0.0 { numerator / total_weight } else { 0.0 });
    }
    out
}

fn rumor_trust_score(votes: &[DampenedVote]) -> f64 {
    let denom: f64 = votes.iter().map(|d| d.weight * d.vote.stake_amount as f64).sum();
    if denom == 0.0 {
        return 50.0;
    }
    let numer: f64 = votes
        .iter()
        .filter(|d| d.vote.choice == Choice::True)
        .map(|d| d.weight * d.vote.stake_amount as f64)
        .sum();
    100.0 * numer / denom
}

fn consensus_label(proportions: &BTreeMap<Choice, f64>, has_votes: bool) -> Consensus {
    if !has_votes {
        return Consensus::Unverified;
    }
    let majorities: Vec<Choice> = Choice::ALL
        .into_iter()
        .filter(|c| proportions.get(c).copied().unwrap_or(0.0) > 0.5)
        .collect();
    match majorities.as_slice() {
        [Choice::True] => Consensus::True,
        [Choice::False] => Consensus::False,
        [Choice::Unverified] => Consensus::Unverified,
        _ => Consensus::Disputed,
    }
}

fn bts(votes: &[DampenedVote], proportions: &BTreeMap<Choice, f64>, config: &Config) -> ScoreResult {
    let total_weight: f64 = votes.iter().map(|d| d.weight).sum();
    let floor = config.prediction_floor;

    let mut geometric_means = BTreeMap::new();
    for choice in Choice::ALL {
        let log_sum: f64 = votes
            .iter()
            .map(|d| d.weight * d.vote.prediction.floored(choice, floor).max(floor).ln())
            .sum();
        let log_mean = if total_weight > 0.0 { log_sum / total_weight } else { floor.ln() };
        geometric_means.insert(choice, log_mean.exp());
    }

    let mut voter_scores = BTreeMap::new();
    for d in votes {
        let k_i = d.vote.choice;
        let x_bar = proportions.get(&k_i).copied().unwrap_or(0.0).max(floor);
        let y_bar = geometric_means.get(&k_i).copied().unwrap_or(floor).max(floor);
        let info = (x_bar / y_bar).ln();

        let pred: f64 = Choice::ALL
            .into_iter()
            .map(|k| {
                let x_k = proportions.get(&k).copied().unwrap_or(0.0).max(floor);
                let p_k = d.vote.prediction.floored(k, floor).max(floor);
                x_k * (p_k / x_k).ln()
            })
            .sum();

        let score = info + config.bts_alpha * pred;
        voter_scores.insert(d.vote.voter_nullifier.clone(), score);
    }

    ScoreResult {
        engine: Engine::Bts,
        rumor_trust_score: rumor_trust_score(votes),
        voter_scores,
        actual_proportions: proportions.clone(),
        consensus: consensus_label(proportions, !votes.is_empty()),
        geometric_means: Some(geometric_means),
        peer_assignments: None,
    }
}

/// A Mulberry32-style 32-bit PRNG, chosen to make peer assignment a pure,
/// reproducible function of `(rumorId, blockHeight)` rather than true
/// randomness (P8 determinism).
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    fn seeded(rumor_id: &RumorId, block_height: u64) -> Self {
        let material = format!("{}:{}", rumor_id.0, block_height);
        let digest = calculate_sha256(material.as_bytes());
        let seed = u32::from_be_bytes([digest.0[0], digest.0[1], digest.0[2], digest.0[3]]);
        Mulberry32 { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61)) ^ t;
        t ^ (t >> 14)
    }

    fn next_index(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n
    }
}

fn assign_peers(n: usize, rumor_id: &RumorId, block_height: u64) -> Vec<PeerAssignment> {
    let mut rng = Mulberry32::seeded(rumor_id, block_height);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut r = rng.next_index(n);
        let mut attempts = 0;
        while r == i && attempts < 100 {
            r = rng.next_index(n);
            attempts += 1;
        }

        let mut p = rng.next_index(n);
        attempts = 0;
        while (p == i || p == r) && attempts < 100 {
            p = rng.next_index(n);
            attempts += 1;
        }
        // N=3 with no third distinct choice: fall back to the reference.
        out.push(PeerAssignment { reference: r, peer: p });
    }
    out
}

fn rbts(
    votes: &[DampenedVote],
    proportions: &BTreeMap<Choice, f64>,
    rumor_id: &RumorId,
    block_height: u64,
    config: &Config,
) -> ScoreResult {
    let floor = config.prediction_floor;
    let assignments = assign_peers(votes.len(), rumor_id, block_height);

    let mut voter_scores = BTreeMap::new();
    let mut peer_assignments = BTreeMap::new();
    for (i, d) in votes.iter().enumerate() {
        let assignment = assignments[i];
        let reference_choice = votes[assignment.reference].vote.choice;
        let peer_choice = votes[assignment.peer].vote.choice;

        let info = if d.vote.choice == reference_choice { 1.0 } else { 0.0 };
        let pred = d.vote.prediction.floored(peer_choice, floor).max(floor).ln();
        let score = info + config.bts_alpha * pred;

        voter_scores.insert(d.vote.voter_nullifier.clone(), score);
        peer_assignments.insert(d.vote.voter_nullifier.clone(), assignment);
    }

    ScoreResult {
        engine: Engine::Rbts,
        rumor_trust_score: rumor_trust_score(votes),
        voter_scores,
        actual_proportions: proportions.clone(),
        consensus: consensus_label(proportions, !votes.is_empty()),
        geometric_means: None,
        peer_assignments: Some(peer_assignments),
    }
}

fn neutral() -> ScoreResult {
    ScoreResult {
        engine: Engine::Neutral,
        rumor_trust_score: 50.0,
        voter_scores: BTreeMap::new(),
        actual_proportions: BTreeMap::new(),
        consensus: Consensus::Unverified,
        geometric_means: None,
        peer_assignments: None,
    }
}

/// Score dampened votes for one rumor, selecting BTS, RBTS or a neutral
/// result by vote count (§4.F "Engine selection").
pub fn score(votes: &[DampenedVote], rumor_id: &RumorId, block_height: u64, config: &Config) -> ScoreResult {
    let n = votes.len();
    if n >= config.rbts_threshold {
        let proportions = weighted_actual_proportions(votes);
        bts(votes, &proportions, config)
    } else if n >= 3 {
        let proportions = weighted_actual_proportions(votes);
        rbts(votes, &proportions, rumor_id, block_height, config)
    } else {
        neutral()
    }
}
