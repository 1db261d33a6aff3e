//! Trust Propagator — Personalized PageRank (§4.H).
use std::collections::BTreeMap;

use log::debug;

use rumorcast_config::Config;
use rumorcast_data_structures::{Choice, Nullifier, RumorId};

use crate::scoring::{Consensus, ScoreResult};

/// One historical vote, reduced to what the co-correct graph needs.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalVote {
    /// Who voted.
    pub nullifier: Nullifier,
    /// What they voted.
    pub choice: Choice,
}

/// Per-rumor history of votes and the scoring result for that rumor, the
/// two inputs the graph is built from.
pub type VoteHistoryByRumor = BTreeMap<RumorId, Vec<HistoricalVote>>;
/// Per-rumor scoring result, supplying the consensus label and per-voter
/// score magnitude used as edge weight.
pub type ScoreHistoryByRumor = BTreeMap<RumorId, ScoreResult>;

/// Output of a PPR run.
#[derive(Clone, Debug, PartialEq)]
pub struct PprResult {
    /// Personalized PageRank mass per node.
    pub scores: BTreeMap<Nullifier, f64>,
    /// Iterations actually run.
    pub iterations: usize,
    /// Whether the max-delta tolerance was reached before `max_iterations`.
    pub converged: bool,
}

/// Undirected co-correct graph, represented as two directed adjacency maps
/// (outgoing edge weight, and total out-degree per node).
struct Graph {
    nodes: Vec<Nullifier>,
    edges: BTreeMap<Nullifier, BTreeMap<Nullifier, f64>>,
    out_degree: BTreeMap<Nullifier, f64>,
}

/// Build the co-correct graph: for every rumor whose consensus is `TRUE` or
/// `FALSE`, connect every pair of voters who chose the consensus answer with
/// an edge weighted by the average magnitude of their scores (§4.H "Graph
/// construction").
fn build_graph(votes: &VoteHistoryByRumor, scores: &ScoreHistoryByRumor) -> Graph {
    let mut nodes: std::collections::BTreeSet<Nullifier> = std::collections::BTreeSet::new();
    for history in votes.values() {
        for v in history {
            nodes.insert(v.nullifier.clone());
        }
    }

    let mut edges: BTreeMap<Nullifier, BTreeMap<Nullifier, f64>> = BTreeMap::new();
    for (rumor_id, history) in votes {
        let Some(result) = scores.get(rumor_id) else {
            continue;
        };
        let consensus_choice = match result.consensus {
            Consensus::True => Choice::True,
            Consensus::False => Choice::False,
            Consensus::Disputed | Consensus::Unverified => continue,
        };
        let correct: Vec<&HistoricalVote> = history.iter().filter(|v| v.choice == consensus_choice).collect();
        for a in 0..correct.len() {
            for b in (a + 1)..correct.len() {
                let va = correct[a];
                let vb = correct[b];
                if va.nullifier == vb.nullifier {
                    continue;
                }
                let score_a = result.voter_scores.get(&va.nullifier).copied().unwrap_or(0.0).abs();
                let score_b = result.voter_scores.get(&vb.nullifier).copied().unwrap_or(0.0).abs();
                let weight = (score_a + score_b) / 2.0;

                *edges
                    .entry(va.nullifier.clone())
                    .or_default()
                    .entry(vb.nullifier.clone())
                    .or_insert(0.0) += weight;
                *edges
                    .entry(vb.nullifier.clone())
                    .or_default()
                    .entry(va.nullifier.clone())
                    .or_insert(0.0) += weight;
            }
        }
    }

    let mut out_degree = BTreeMap::new();
    for (node, out_edges) in &edges {
        out_degree.insert(node.clone(), out_edges.values().sum());
    }

    Graph {
        nodes: nodes.into_iter().collect(),
        edges,
        out_degree,
    }
}

/// Run Personalized PageRank over the co-correct graph built from `votes`
/// and `scores`. `trust_seeds`, if non-empty and summing to a positive
/// value, is normalized and used as the personalization vector; otherwise a
/// uniform vector is used.
pub fn propagate(
    votes: &VoteHistoryByRumor,
    scores: &ScoreHistoryByRumor,
    trust_seeds: &BTreeMap<Nullifier, f64>,
    config: &Config,
) -> PprResult {
    let graph = build_graph(votes, scores);
    let n = graph.nodes.len();
    if n == 0 {
        return PprResult {
            scores: BTreeMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let seed_sum: f64 = trust_seeds.values().sum();
    let personalization: BTreeMap<Nullifier, f64> = if seed_sum > 0.0 {
        trust_seeds.iter().map(|(k, v)| (k.clone(), v / seed_sum)).collect()
    } else {
        let uniform = 1.0 / n as f64;
        graph.nodes.iter().map(|node| (node.clone(), uniform)).collect()
    };

    let mut ppr: BTreeMap<Nullifier, f64> = graph
        .nodes
        .iter()
        .map(|node| (node.clone(), personalization.get(node).copied().unwrap_or(0.0)))
        .collect();

    let d = config.ppr_damping;
    let mut converged = false;
    let mut iterations = 0;
    for _ in 0..config.ppr_max_iterations {
        iterations += 1;
        let mut next: BTreeMap<Nullifier, f64> = graph
            .nodes
            .iter()
            .map(|node| (node.clone(), (1.0 - d) * personalization.get(node).copied().unwrap_or(0.0)))
            .collect();

        for (v, out_edges) in &graph.edges {
            let ppr_v = ppr.get(v).copied().unwrap_or(0.0);
            let out_deg = graph.out_degree.get(v).copied().unwrap_or(0.0);
            if out_deg == 0.0 {
                continue;
            }
            for (u, weight) in out_edges {
                *next.entry(u.clone()).or_insert(0.0) += d * ppr_v * weight / out_deg;
            }
        }

        let max_delta = graph
            .nodes
            .iter()
            .map(|node| (next.get(node).copied().unwrap_or(0.0) - ppr.get(node).copied().unwrap_or(0.0)).abs())
            .fold(0.0_f64, f64::max);

        ppr = next;
        if max_delta < config.ppr_tolerance {
            converged = true;
            break;
        }
    }

    debug!("PPR converged={converged} after {iterations} iterations over {n} nodes");
    PprResult {
        scores: ppr,
        iterations,
        converged,
    }
}

/// Per-rumor PPR-weighted trust: `100 * sum(PPR(v) for v voting TRUE) /
/// sum(PPR(v))`, or `50` if the denominator is zero (§4.H).
pub fn ppr_weighted_trust(history: &[HistoricalVote], ppr: &PprResult) -> f64 {
    let denom: f64 = history.iter().map(|v| ppr.scores.get(&v.nullifier).copied().unwrap_or(0.0)).sum();
    if denom == 0.0 {
        return 50.0;
    }
    let numer: f64 = history
        .iter()
        .filter(|v| v.choice == Choice::True)
        .map(|v| ppr.scores.get(&v.nullifier).copied().unwrap_or(0.0))
        .sum();
    100.0 * numer / denom
}
