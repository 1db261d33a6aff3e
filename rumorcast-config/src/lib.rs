//! # Config
//!
//! Named tuning constants for the scoring, reputation and sync pipeline,
//! collected into one `Config` struct so a host can override any of them
//! (e.g. from a TOML file or environment) without the scoring/reputation/sync
//! code depending on a particular loader. Loading from a file is a host
//! concern and is not implemented here, so this stays a separate, swappable
//! layer in front of whatever a host uses to load it.
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

use serde::{Deserialize, Serialize};

/// All tunable parameters of the scoring, reputation and sync pipeline.
///
/// A host may deserialize a partial override on top of [`Config::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum rumor text length, in chars (3. Data Model, Rumor).
    pub max_rumor_text_len: usize,
    /// Maximum serialized envelope size before transmission, in bytes (4.A).
    pub max_message_size: usize,
    /// Floor applied to every prediction probability before it is used in a
    /// logarithm (I3, 4.F).
    pub prediction_floor: f64,
    /// Allowed absolute deviation of `sum(prediction)` from `1.0` (I3).
    pub prediction_sum_tolerance: f64,

    /// Pearson correlation threshold above which two voters are unioned into
    /// the same cluster (4.E).
    pub cluster_threshold: f64,
    /// `lambda` in the per-cluster weight formula `W = 1 / (1 + lambda * rho_bar)` (4.E).
    pub correlation_lambda: f64,

    /// Minimum dampened-vote count required to run BTS instead of RBTS (4.F).
    pub rbts_threshold: usize,
    /// `alpha` multiplier applied to the prediction-score term in both BTS
    /// and RBTS (4.F).
    pub bts_alpha: f64,

    /// Starting reputation score for a newly joined account (3. Data Model).
    pub initial_trust_score: f64,
    /// Minimum stake amount permitted for a vote (4.G).
    pub min_stake_vote: u64,
    /// Minimum stake amount permitted for a rumor post (4.G).
    pub min_stake_post: u64,
    /// Minimum stake amount permitted for a dispute (4.G).
    pub min_stake_dispute: u64,
    /// Multiplier applied to positive BTS/RBTS scores when rewarding (4.G).
    pub reward_mult: f64,
    /// Multiplier applied to negative BTS/RBTS scores when slashing (4.G).
    pub slash_mult: f64,
    /// Multiplicative per-sweep reputation decay rate (4.G).
    pub decay_rate: f64,
    /// Additive per-sweep reputation recovery rate, capped at
    /// `initial_trust_score` (4.G).
    pub recovery_rate: f64,
    /// Lower clamp for reputation scores (I4).
    pub min_score: f64,
    /// Upper clamp for reputation scores (I4).
    pub max_score: f64,

    /// Damping factor `d` for Personalized PageRank (4.H).
    pub ppr_damping: f64,
    /// Convergence tolerance for Personalized PageRank (4.H).
    pub ppr_tolerance: f64,
    /// Maximum iterations before Personalized PageRank gives up (4.H).
    pub ppr_max_iterations: usize,

    /// Number of applied ops between automatic snapshots (4.C).
    pub snapshot_interval: u64,
    /// Minimum time between two anti-entropy sync exchanges with the same
    /// peer, in seconds (4.I).
    pub sync_cooldown_secs: u64,
    /// Maximum number of entries included per store in one sync response
    /// (4.I).
    pub max_sync_batch_size: usize,
    /// Number of historical membership Merkle roots an identity verifier is
    /// asked to tolerate (§6).
    pub root_history_size: usize,
    /// Capacity of the bounded envelope ring buffer; oldest unvalidated
    /// envelopes are dropped past this point (§5 "Backpressure").
    pub envelope_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_rumor_text_len: 2000,
            max_message_size: 64 * 1024,
            prediction_floor: 0.001,
            prediction_sum_tolerance: 0.02,

            cluster_threshold: 0.85,
            correlation_lambda: 10.0,

            rbts_threshold: 30,
            bts_alpha: 1.0,

            initial_trust_score: 10.0,
            min_stake_vote: 1,
            min_stake_post: 5,
            min_stake_dispute: 3,
            reward_mult: 1.0,
            slash_mult: 1.5,
            decay_rate: 0.99,
            recovery_rate: 0.1,
            min_score: 0.0,
            max_score: 1000.0,

            ppr_damping: 0.85,
            ppr_tolerance: 1e-6,
            ppr_max_iterations: 100,

            snapshot_interval: 10,
            sync_cooldown_secs: 30,
            max_sync_batch_size: 100,
            root_history_size: 10,
            envelope_queue_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.rbts_threshold, 30);
        assert_eq!(c.correlation_lambda, 10.0);
        assert_eq!(c.cluster_threshold, 0.85);
        assert_eq!(c.initial_trust_score, 10.0);
        assert_eq!(c.max_score, 1000.0);
    }

    #[test]
    fn partial_override_via_deserialize() {
        let c: Config = serde_json::from_str(r#"{"rbts_threshold": 5}"#).unwrap();
        assert_eq!(c.rbts_threshold, 5);
        // untouched fields keep their default
        assert_eq!(c.correlation_lambda, 10.0);
    }
}
