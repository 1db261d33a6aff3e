//! `GossipNode`: wires envelope validation, the op log, the materialized
//! view, correlation dampening, BTS/RBTS scoring, the reputation ledger and
//! trust propagation into a single cooperative, single-threaded facade (§5).
use std::collections::{BTreeMap, VecDeque};

use log::{info, warn};

use rumorcast_config::Config;
use rumorcast_data_structures::{
    validate, MaterializedView, Nullifier, NullifierSeenSet, Operation, OperationLog, RumorId,
    SnapshotSink, Tombstone, TombstoneAuthority, TombstoneReason,
};
use rumorcast_p2p::{AntiEntropyEngine, StoreKey};
use rumorcast_reputation::ReputationLedger;
use rumorcast_validations::dampener::{self, VoteHistory, VoteHistoryEntry};
use rumorcast_validations::scoring::{self, ScoreResult};
use rumorcast_validations::trust::{self, HistoricalVote, PprResult, ScoreHistoryByRumor, VoteHistoryByRumor};

use crate::error::NodeError;

/// A cooperative, single-writer gossip node (§5: "the op log, view maps,
/// reputation ledger ... are owned by the node's core task").
pub struct GossipNode {
    config: Config,
    log: OperationLog,
    view: MaterializedView,
    dedup: NullifierSeenSet,
    authority: TombstoneAuthority,
    ledger: ReputationLedger<Nullifier, RumorId>,
    sync: AntiEntropyEngine,
    vote_history: VoteHistory,
    vote_history_by_rumor: VoteHistoryByRumor,
    score_history: ScoreHistoryByRumor,
    pending_envelopes: VecDeque<Vec<u8>>,
}

impl GossipNode {
    /// A fresh node with empty state.
    pub fn new(config: Config) -> Self {
        let ledger = ReputationLedger::new(config.clone());
        let view = MaterializedView::new(&config);
        let sync = AntiEntropyEngine::new(&config);
        GossipNode {
            pending_envelopes: VecDeque::with_capacity(config.envelope_queue_capacity),
            config,
            log: OperationLog::new(),
            view,
            dedup: NullifierSeenSet::new(),
            authority: TombstoneAuthority::new(),
            ledger,
            sync,
            vote_history: VoteHistory::new(),
            vote_history_by_rumor: VoteHistoryByRumor::new(),
            score_history: ScoreHistoryByRumor::new(),
        }
    }

    /// Read-only access to the materialized view.
    pub fn view(&self) -> &MaterializedView {
        &self.view
    }

    /// Read-only access to the reputation ledger.
    pub fn ledger(&self) -> &ReputationLedger<Nullifier, RumorId> {
        &self.ledger
    }

    /// Read-only access to the anti-entropy engine.
    pub fn sync(&self) -> &AntiEntropyEngine {
        &self.sync
    }

    /// Queue a raw gossip envelope for ingest, dropping the oldest queued
    /// (but not-yet-validated) envelope if at capacity (§5 "Backpressure").
    /// Validated ops themselves are never dropped.
    pub fn enqueue(&mut self, bytes: Vec<u8>) {
        if self.pending_envelopes.len() >= self.config.envelope_queue_capacity {
            warn!("envelope queue at capacity, dropping oldest unvalidated envelope");
            self.pending_envelopes.pop_front();
        }
        self.pending_envelopes.push_back(bytes);
    }

    /// Drain and ingest every queued envelope in FIFO order, returning how
    /// many were accepted.
    pub fn drain_queue(&mut self, topic: &str, now: i64, sink: &mut dyn SnapshotSink) -> usize {
        let queued: Vec<Vec<u8>> = self.pending_envelopes.drain(..).collect();
        queued
            .into_iter()
            .filter(|bytes| self.ingest_envelope(topic, bytes, now, sink).is_ok())
            .count()
    }

    fn canonical_bytes(op: &Operation) -> Vec<u8> {
        serde_json::to_vec(op).expect("Operation serializes to JSON")
    }

    fn store_key_for(op: &Operation) -> StoreKey {
        match op {
            Operation::Rumor(_) => StoreKey::Rumors,
            Operation::Vote(_) => StoreKey::Votes,
            Operation::Join(_) => StoreKey::Identities,
            Operation::Tombstone(_) => StoreKey::Rumors,
        }
    }

    /// Validate one gossip envelope and, if accepted, append it to the log,
    /// fold it into the materialized view, and feed the anti-entropy store
    /// (§4.A -> §4.B -> §4.C -> §4.I). On the real gossip path a caller
    /// should treat any `Err` as a silent drop (§7); this returns the error
    /// so local-API callers and tests can inspect it.
    pub fn ingest_envelope(
        &mut self,
        topic: &str,
        bytes: &[u8],
        now: i64,
        sink: &mut dyn SnapshotSink,
    ) -> Result<u64, NodeError> {
        let op = validate(topic, bytes, &self.config)?;
        if !self.dedup.admit(&op) {
            return Err(NodeError::DuplicateNullifier);
        }

        self.bookkeep(&op);
        let index = self.log.append(op.clone(), now);
        self.view.apply(&op, now, self.log.len() as u64, sink);
        self.sync.store_mut(Self::store_key_for(&op)).insert(Self::canonical_bytes(&op));
        Ok(index)
    }

    fn bookkeep(&mut self, op: &Operation) {
        match op {
            Operation::Rumor(r) => {
                self.authority.register_rumor(r.id.clone(), r.author_nullifier.clone());
            }
            Operation::Join(j) => {
                self.ledger.register(j.nullifier.clone());
            }
            Operation::Vote(v) => {
                self.vote_history
                    .entry(v.voter_nullifier.clone())
                    .or_default()
                    .push(VoteHistoryEntry {
                        rumor_id: v.rumor_id.clone(),
                        choice: v.choice,
                    });
                self.vote_history_by_rumor
                    .entry(v.rumor_id.clone())
                    .or_default()
                    .push(HistoricalVote {
                        nullifier: v.voter_nullifier.clone(),
                        choice: v.choice,
                    });
            }
            Operation::Tombstone(t) => {
                self.authority.mark_tombstoned(t.rumor_id.clone());
            }
        }
    }

    /// Construct and admit a TOMBSTONE op authored by `author_nullifier`
    /// (§4.D), ingesting it exactly as if it had arrived over gossip.
    pub fn tombstone(
        &mut self,
        rumor_id: RumorId,
        author_nullifier: Nullifier,
        reason: TombstoneReason,
        now: i64,
        sink: &mut dyn SnapshotSink,
    ) -> Result<u64, NodeError> {
        let tombstone: Tombstone = self.authority.create(rumor_id, author_nullifier, reason, now)?;
        let op = Operation::Tombstone(tombstone);
        if !self.dedup.admit(&op) {
            return Err(NodeError::DuplicateNullifier);
        }
        self.bookkeep(&op);
        let index = self.log.append(op.clone(), now);
        self.view.apply(&op, now, self.log.len() as u64, sink);
        Ok(index)
    }

    /// Run correlation dampening then BTS/RBTS scoring for `rumor_id`'s
    /// current votes, and apply the result to the reputation ledger
    /// (§4.E -> §4.F -> §4.G). Returns `None` if the rumor has no votes.
    pub fn score_rumor(&mut self, rumor_id: &RumorId, block_height: u64) -> Option<ScoreResult> {
        let votes = self.view.state().votes.get(rumor_id)?.clone();
        if votes.is_empty() {
            return None;
        }
        let dampened = dampener::dampen(&votes, &self.vote_history, &self.config);
        let result = scoring::score(&dampened, rumor_id, block_height, &self.config);

        let stakes: BTreeMap<Nullifier, u64> = votes.iter().map(|v| (v.voter_nullifier.clone(), v.stake_amount)).collect();
        let applied = self.ledger.apply_scores(&result.voter_scores, &stakes, rumor_id.clone());
        info!(
            "scored {:?}: {} rewards, {} slashes",
            rumor_id,
            applied.rewards.len(),
            applied.slashes.len()
        );

        self.score_history.insert(rumor_id.clone(), result.clone());
        Some(result)
    }

    /// Apply a cluster-wide slash for coordinated voters caught by the
    /// dampener (§4.E/§4.G).
    pub fn slash_cluster(&mut self, nullifiers: &[Nullifier], base_penalty: f64, rumor_id: RumorId) -> BTreeMap<Nullifier, f64> {
        self.ledger.apply_group_slash(nullifiers, base_penalty, rumor_id)
    }

    /// Run Personalized PageRank over every rumor scored so far (§4.H).
    /// `trust_seeds` is optional; an empty map falls back to uniform
    /// personalization.
    pub fn propagate_trust(&self, trust_seeds: &BTreeMap<Nullifier, f64>) -> PprResult {
        trust::propagate(&self.vote_history_by_rumor, &self.score_history, trust_seeds, &self.config)
    }

    /// Force a materialized-view rebuild from the full log (§4.C).
    pub fn rebuild_view(&mut self, now: i64) {
        self.view.rebuild(&self.log, now);
    }

    /// Periodic reputation sweep: decay every account, then let accounts
    /// below the initial trust score recover (§4.G).
    pub fn run_reputation_sweep(&mut self) {
        self.ledger.apply_decay(None);
        self.ledger.apply_recovery(None);
    }
}
