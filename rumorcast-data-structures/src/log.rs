//! Operation log (§4.B).
//!
//! Append-only, ordered solely by ingest index — never by the gossip-supplied
//! timestamp (P9 "append order determines state, not wall-clock time").
use log::trace;

use crate::op::{LogEntry, Operation};

/// An in-memory append-only sequence of accepted operations.
#[derive(Debug, Default)]
pub struct OperationLog {
    entries: Vec<LogEntry>,
}

impl OperationLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `op`, stamping it with the next monotonic `ingest_index` and
    /// `ingested_at`. Returns the assigned index.
    pub fn append(&mut self, op: Operation, ingested_at: i64) -> u64 {
        let ingest_index = self.entries.len() as u64;
        trace!("appending op at index {ingest_index}");
        self.entries.push(LogEntry {
            op,
            ingest_index,
            ingested_at,
        });
        ingest_index
    }

    /// Append a batch of operations as a single run of consecutive indices.
    /// Equivalent to calling [`Self::append`] once per item in order (P9).
    pub fn append_batch(&mut self, ops: impl IntoIterator<Item = Operation>, ingested_at: i64) -> Vec<u64> {
        ops.into_iter()
            .map(|op| self.append(op, ingested_at))
            .collect()
    }

    /// Iterate entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of entries in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from `from_index` (inclusive) onward, for anti-entropy
    /// catch-up or incremental replay.
    pub fn entries_from(&self, from_index: u64) -> &[LogEntry] {
        let start = (from_index as usize).min(self.entries.len());
        &self.entries[start..]
    }

    /// Export the full log, e.g. for on-disk persistence or sync bulk
    /// transfer.
    pub fn export_all(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Replace the log wholesale with `entries` (R1 "log export/import round
    /// trip"). Does not re-validate; the caller is responsible for importing
    /// a log it trusts (e.g. its own prior export).
    pub fn import_all(&mut self, entries: Vec<LogEntry>) {
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{Nullifier, RumorId};
    use crate::rumor::{Rumor, Topic};

    fn rumor_op(text: &str, nullifier: &str) -> Operation {
        Operation::Rumor(Rumor {
            id: RumorId(text.into()),
            text: text.into(),
            topic: Topic::General,
            author_nullifier: Nullifier(nullifier.into()),
            timestamp: 0,
        })
    }

    #[test]
    fn append_assigns_monotonic_indices() {
        let mut log = OperationLog::new();
        let i0 = log.append(rumor_op("a", "n1"), 100);
        let i1 = log.append(rumor_op("b", "n2"), 101);
        assert_eq!(i0, 0);
        assert_eq!(i1, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn export_import_round_trip() {
        let mut log = OperationLog::new();
        log.append(rumor_op("a", "n1"), 1);
        log.append(rumor_op("b", "n2"), 2);
        let exported = log.export_all().to_vec();

        let mut restored = OperationLog::new();
        restored.import_all(exported);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.iter().next().unwrap().ingest_index, 0);
    }

    #[test]
    fn batch_append_matches_sequential_append() {
        let mut batched = OperationLog::new();
        let indices = batched.append_batch(
            vec![rumor_op("a", "n1"), rumor_op("b", "n2"), rumor_op("c", "n3")],
            10,
        );
        assert_eq!(indices, vec![0, 1, 2]);

        let mut sequential = OperationLog::new();
        sequential.append(rumor_op("a", "n1"), 10);
        sequential.append(rumor_op("b", "n2"), 10);
        sequential.append(rumor_op("c", "n3"), 10);

        let batched_ops: Vec<_> = batched.iter().map(|e| &e.op).collect();
        let sequential_ops: Vec<_> = sequential.iter().map(|e| &e.op).collect();
        assert_eq!(batched_ops, sequential_ops);
    }

    #[test]
    fn entries_from_slices_correctly() {
        let mut log = OperationLog::new();
        log.append(rumor_op("a", "n1"), 1);
        log.append(rumor_op("b", "n2"), 2);
        log.append(rumor_op("c", "n3"), 3);
        assert_eq!(log.entries_from(1).len(), 2);
        assert_eq!(log.entries_from(10).len(), 0);
    }
}
