//! Correlation Dampener (§4.E).
//!
//! Reduces the effective voting power of coordinated clusters by comparing
//! each voter's historical choices against every other current voter's.
use std::collections::{BTreeMap, BTreeSet};

use rumorcast_config::Config;
use rumorcast_data_structures::{Choice, Nullifier, RumorId, Vote};

/// One entry of a voter's historical choices, used to build the feature
/// vector for correlation.
#[derive(Clone, Debug, PartialEq)]
pub struct VoteHistoryEntry {
    /// The rumor the historical vote was cast on.
    pub rumor_id: RumorId,
    /// The choice made.
    pub choice: Choice,
}

/// Per-voter vote history, keyed by nullifier.
pub type VoteHistory = BTreeMap<Nullifier, Vec<VoteHistoryEntry>>;

/// One current vote after dampening: its original [`Vote`] plus the
/// computed cluster weight.
#[derive(Clone, Debug, PartialEq)]
pub struct DampenedVote {
    /// The original vote.
    pub vote: Vote,
    /// Effective weight in `(0, 1]`.
    pub weight: f64,
    /// Id of the cluster this voter was unioned into (stable only within
    /// one call to [`dampen`]).
    pub cluster_id: usize,
    /// Size of that cluster.
    pub cluster_size: usize,
}

fn encode_choice(choice: Choice) -> f64 {
    match choice {
        Choice::True => 1.0,
        Choice::False => -1.0,
        Choice::Unverified => 0.0,
    }
}

/// Build the feature vector for `nullifier` over `axis` (sorted rumor ids),
/// using `NaN` for rumors the voter never voted on.
fn feature_vector(history: &VoteHistory, nullifier: &Nullifier, axis: &[RumorId]) -> Vec<f64> {
    let by_rumor: BTreeMap<&RumorId, Choice> = history
        .get(nullifier)
        .into_iter()
        .flatten()
        .map(|e| (&e.rumor_id, e.choice))
        .collect();
    axis.iter()
        .map(|rumor_id| {
            by_rumor
                .get(rumor_id)
                .map(|c| encode_choice(*c))
                .unwrap_or(f64::NAN)
        })
        .collect()
}

/// Pearson correlation over dimensions where both vectors are non-NaN.
/// Returns `None` if fewer than 2 such dimensions exist.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 && var_y == 0.0 {
        // Zero-variance identical vectors correlate perfectly (§4.E).
        return Some(if pairs.iter().all(|(x, y)| x == y) { 1.0 } else { 0.0 });
    }
    if var_x == 0.0 || var_y == 0.0 {
        return Some(0.0);
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Disjoint-set forest with path compression, used to union voters whose
/// correlation exceeds the cluster threshold.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Dampen `votes` (all cast on the same rumor) using `history` of every
/// voter's past choices. Degenerate inputs (empty votes, or a single voter)
/// yield every voter its own singleton cluster with weight `1.0`.
pub fn dampen(votes: &[Vote], history: &VoteHistory, config: &Config) -> Vec<DampenedVote> {
    if votes.is_empty() {
        return Vec::new();
    }
    if votes.len() == 1 {
        return vec![DampenedVote {
            vote: votes[0].clone(),
            weight: 1.0,
            cluster_id: 0,
            cluster_size: 1,
        }];
    }

    let axis: Vec<RumorId> = votes
        .iter()
        .flat_map(|v| history.get(&v.voter_nullifier).into_iter().flatten())
        .map(|e| e.rumor_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let vectors: Vec<Vec<f64>> = votes
        .iter()
        .map(|v| feature_vector(history, &v.voter_nullifier, &axis))
        .collect();

    let n = votes.len();
    let mut correlations: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(rho) = pearson(&vectors[i], &vectors[j]) {
                correlations.insert((i, j), rho);
                if rho > config.cluster_threshold {
                    uf.union(i, j);
                }
            }
        }
    }

    let mut members_by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = uf.find(i);
        members_by_root.entry(root).or_default().push(i);
    }

    let mut cluster_id_of = vec![0usize; n];
    let mut weight_of = vec![1.0f64; n];
    let mut size_of = vec![1usize; n];
    for (cluster_id, (_, members)) in members_by_root.iter().enumerate() {
        let size = members.len();
        let weight = if size <= 1 {
            1.0
        } else {
            let mut sum_rho = 0.0;
            let mut count = 0usize;
            for a in 0..members.len() {
                for b in (a + 1)..members.len() {
                    let (lo, hi) = (members[a].min(members[b]), members[a].max(members[b]));
                    if let Some(rho) = correlations.get(&(lo, hi)) {
                        sum_rho += rho;
                        count += 1;
                    }
                }
            }
            let rho_bar = if count > 0 { sum_rho / count as f64 } else { 1.0 };
            1.0 / (1.0 + config.correlation_lambda * rho_bar)
        };
        for &member in members {
            cluster_id_of[member] = cluster_id;
            weight_of[member] = weight;
            size_of[member] = size;
        }
    }

    votes
        .iter()
        .enumerate()
        .map(|(i, v)| DampenedVote {
            vote: v.clone(),
            weight: weight_of[i],
            cluster_id: cluster_id_of[i],
            cluster_size: size_of[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rumorcast_data_structures::Prediction;

    fn cfg() -> Config {
        Config::default()
    }

    fn vote(nullifier: &str, choice: Choice) -> Vote {
        Vote {
            rumor_id: RumorId("current".into()),
            voter_nullifier: Nullifier(nullifier.into()),
            choice,
            prediction: Prediction::new(0.9, 0.05, 0.05),
            stake_amount: 1,
            timestamp: 0,
        }
    }

    fn history_entry(rumor_id: &str, choice: Choice) -> VoteHistoryEntry {
        VoteHistoryEntry {
            rumor_id: RumorId(rumor_id.into()),
            choice,
        }
    }

    #[test]
    fn empty_votes_yield_empty_output() {
        let result = dampen(&[], &VoteHistory::new(), &cfg());
        assert!(result.is_empty());
    }

    #[test]
    fn single_voter_gets_full_weight() {
        let votes = vec![vote("n1", Choice::True)];
        let result = dampen(&votes, &VoteHistory::new(), &cfg());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].weight, 1.0);
        assert_eq!(result[0].cluster_size, 1);
    }

    #[test]
    fn identical_histories_cluster_and_dampen() {
        let mut history = VoteHistory::new();
        let shared = vec![
            history_entry("r1", Choice::True),
            history_entry("r2", Choice::False),
            history_entry("r3", Choice::True),
        ];
        for n in ["n1", "n2"] {
            history.insert(Nullifier(n.into()), shared.clone());
        }
        let votes = vec![vote("n1", Choice::True), vote("n2", Choice::True)];
        let result = dampen(&votes, &history, &cfg());
        assert_eq!(result[0].cluster_id, result[1].cluster_id);
        assert_eq!(result[0].cluster_size, 2);
        // W = 1 / (1 + 10*1.0) = 1/11
        assert_relative_eq!(result[0].weight, 1.0 / 11.0, epsilon = 1e-9);
    }

    #[test]
    fn uncorrelated_voters_remain_singletons() {
        let mut history = VoteHistory::new();
        history.insert(
            Nullifier("n1".into()),
            vec![history_entry("r1", Choice::True), history_entry("r2", Choice::False)],
        );
        history.insert(
            Nullifier("n2".into()),
            vec![history_entry("r1", Choice::False), history_entry("r2", Choice::True)],
        );
        let votes = vec![vote("n1", Choice::True), vote("n2", Choice::False)];
        let result = dampen(&votes, &history, &cfg());
        assert_ne!(result[0].cluster_id, result[1].cluster_id);
        assert_eq!(result[0].weight, 1.0);
        assert_eq!(result[1].weight, 1.0);
    }

    #[test]
    fn fifty_lockstep_voters_approach_n_over_eleven() {
        let mut history = VoteHistory::new();
        let shared = vec![
            history_entry("r1", Choice::True),
            history_entry("r2", Choice::False),
        ];
        let mut votes = Vec::new();
        for i in 0..50 {
            let n = format!("n{i}");
            history.insert(Nullifier(n.clone()), shared.clone());
            votes.push(vote(&n, Choice::True));
        }
        let result = dampen(&votes, &history, &cfg());
        let total_weight: f64 = result.iter().map(|d| d.weight).sum();
        // 50 / 11 ~= 4.545
        assert_relative_eq!(total_weight, 50.0 / 11.0, epsilon = 1e-6);
    }
}
