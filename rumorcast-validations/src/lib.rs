//! Correlation dampening, BTS/RBTS scoring and Personalized-PageRank trust
//! propagation (§4.E-4.H).
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod dampener;
pub mod scoring;
pub mod trust;

pub use dampener::{dampen, DampenedVote, VoteHistory, VoteHistoryEntry};
pub use scoring::{score, Consensus, Engine, PeerAssignment, ScoreResult};
pub use trust::{ppr_weighted_trust, propagate, HistoricalVote, PprResult, ScoreHistoryByRumor, VoteHistoryByRumor};
