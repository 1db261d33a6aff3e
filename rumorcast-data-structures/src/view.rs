//! Materialized View / Snapshotter (§4.C).
//!
//! Pure function of the op log (I6): the view can always be thrown away and
//! rebuilt from `OperationLog::iter()` alone.
use std::collections::BTreeMap;

use log::debug;

use rumorcast_config::Config;

use crate::identifiers::{Nullifier, RumorId};
use crate::log::OperationLog;
use crate::op::Operation;
use crate::rumor::Rumor;
use crate::vote::Vote;

/// An opaque, emitted-on-trigger record of view state (§4.C "A snapshot is
/// an opaque record").
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Monotonic id, one per emitted snapshot.
    pub snapshot_id: u64,
    /// Wall-clock time the snapshot was taken.
    pub timestamp: i64,
    /// Length of the op log at snapshot time.
    pub op_log_length: u64,
    /// Rumor ids not tombstoned.
    pub active_rumors: Vec<RumorId>,
    /// Rumor ids tombstoned.
    pub tombstoned_rumors: Vec<RumorId>,
    /// Total votes across all active rumors.
    pub total_votes: usize,
    /// Number of distinct nullifiers with a reputation seed.
    pub registered_users: usize,
    /// Copy of the four derived maps at the time of the snapshot.
    pub state_copy: ViewState,
}

/// The four maps the view derives from the log (§4.C).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    /// Non-tombstoned rumors.
    pub rumors: BTreeMap<RumorId, Rumor>,
    /// Votes per rumor, in the order accepted.
    pub votes: BTreeMap<RumorId, Vec<Vote>>,
    /// Tombstoned rumor ids.
    pub tombstones: std::collections::BTreeSet<RumorId>,
    /// Initial reputation seeds; authoritative mutation happens in the
    /// reputation ledger, not here.
    pub reputation: BTreeMap<Nullifier, f64>,
}

/// Something that can receive emitted snapshots, e.g. a persistence layer or
/// a metrics exporter.
pub trait SnapshotSink {
    /// Called once per emitted snapshot.
    fn on_snapshot(&mut self, snapshot: &Snapshot);
}

/// A no-op sink, useful when nothing downstream needs snapshots.
#[derive(Debug, Default)]
pub struct NullSnapshotSink;

impl SnapshotSink for NullSnapshotSink {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}
}

/// Incrementally maintains [`ViewState`] from accepted operations and emits
/// [`Snapshot`]s on the configured interval.
pub struct MaterializedView {
    state: ViewState,
    ops_since_snapshot: u64,
    snapshot_interval: u64,
    next_snapshot_id: u64,
    initial_trust_score: f64,
}

impl MaterializedView {
    /// An empty view using `config`'s snapshot interval and initial trust
    /// score.
    pub fn new(config: &Config) -> Self {
        MaterializedView {
            state: ViewState::default(),
            ops_since_snapshot: 0,
            snapshot_interval: config.snapshot_interval,
            next_snapshot_id: 0,
            initial_trust_score: config.initial_trust_score,
        }
    }

    /// Read-only access to the current derived state.
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Apply one accepted operation incrementally (§4.C "Incremental apply
    /// rules"), emitting a snapshot through `sink` if the interval is hit.
    pub fn apply(&mut self, op: &Operation, timestamp: i64, op_log_len: u64, sink: &mut dyn SnapshotSink) {
        match op {
            Operation::Rumor(r) => {
                if !self.state.tombstones.contains(&r.id) && !self.state.rumors.contains_key(&r.id) {
                    self.state.rumors.insert(r.id.clone(), r.clone());
                }
            }
            Operation::Vote(v) => {
                if !self.state.tombstones.contains(&v.rumor_id) {
                    self.state.votes.entry(v.rumor_id.clone()).or_default().push(v.clone());
                }
            }
            Operation::Tombstone(t) => {
                self.state.tombstones.insert(t.rumor_id.clone());
                self.state.rumors.remove(&t.rumor_id);
                self.state.votes.remove(&t.rumor_id);
            }
            Operation::Join(j) => {
                self.state
                    .reputation
                    .entry(j.nullifier.clone())
                    .or_insert(self.initial_trust_score);
            }
        }

        self.ops_since_snapshot += 1;
        if self.ops_since_snapshot >= self.snapshot_interval {
            self.ops_since_snapshot = 0;
            let snapshot = self.take_snapshot(timestamp, op_log_len);
            sink.on_snapshot(&snapshot);
        }
    }

    /// Force a snapshot regardless of the interval counter.
    pub fn take_snapshot(&mut self, timestamp: i64, op_log_len: u64) -> Snapshot {
        let snapshot_id = self.next_snapshot_id;
        self.next_snapshot_id += 1;
        let total_votes = self.state.votes.values().map(Vec::len).sum();
        Snapshot {
            snapshot_id,
            timestamp,
            op_log_length: op_log_len,
            active_rumors: self.state.rumors.keys().cloned().collect(),
            tombstoned_rumors: self.state.tombstones.iter().cloned().collect(),
            total_votes,
            registered_users: self.state.reputation.len(),
            state_copy: self.state.clone(),
        }
    }

    /// Rebuild the view from scratch by replaying `log` (§4.C "Rebuild"):
    /// pass 1 collects the tombstone set, pass 2 folds every non-tombstoned
    /// op into fresh state. Idempotent: calling this twice on an unchanged
    /// log yields structurally equal state.
    pub fn rebuild(&mut self, log: &OperationLog, timestamp: i64) -> Snapshot {
        debug!("rebuilding materialized view from {} log entries", log.len());
        let mut tombstones = std::collections::BTreeSet::new();
        for entry in log.iter() {
            if let Operation::Tombstone(t) = &entry.op {
                tombstones.insert(t.rumor_id.clone());
            }
        }

        let mut state = ViewState {
            tombstones: tombstones.clone(),
            ..ViewState::default()
        };

        for entry in log.iter() {
            match &entry.op {
                Operation::Rumor(r) => {
                    if !tombstones.contains(&r.id) && !state.rumors.contains_key(&r.id) {
                        state.rumors.insert(r.id.clone(), r.clone());
                    }
                }
                Operation::Vote(v) => {
                    if !tombstones.contains(&v.rumor_id) {
                        state.votes.entry(v.rumor_id.clone()).or_default().push(v.clone());
                    }
                }
                Operation::Tombstone(_) => {}
                Operation::Join(j) => {
                    state
                        .reputation
                        .entry(j.nullifier.clone())
                        .or_insert(self.initial_trust_score);
                }
            }
        }

        self.state = state;
        self.ops_since_snapshot = 0;
        self.take_snapshot(timestamp, log.len() as u64)
    }
}
