use std::collections::HashSet;

use crate::models::{CanonicalTransaction, DedupKey};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MergeOutcome {
    Inserted,
    /// A record with the same dedup key was already present; the first-seen copy was kept.
    Duplicate
}

/// The in-memory set of canonical records, deduplicated by [`DedupKey`].
///
/// Every mutation bumps `version`. While a fetch is in flight, live-merged records are
/// remembered with the version they were merged at so its snapshot can re-apply them.
#[derive(Debug, Default)]
pub struct TransactionSet {
    records: Vec<CanonicalTransaction>,
    keys: HashSet<DedupKey>,
    live: Vec<(u64, CanonicalTransaction)>,
    tracking_live: bool,
    version: u64
}

impl TransactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CanonicalTransaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of live records remembered for the fetch in flight.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Starts remembering live merges for a fetch that observed `since_version`.
    ///
    /// Entries at or below it are already part of whatever that fetch replaces, so they go.
    pub fn track_live_since(&mut self, since_version: u64) {
        self.live.retain(|(version, _)| *version > since_version);
        self.tracking_live = true;
    }

    /// Forgets the live log once no fetch needs it.
    pub fn stop_tracking_live(&mut self) {
        self.live.clear();
        self.tracking_live = false;
    }

    /// Places a pushed record at the head unless its key is already known.
    pub fn merge_live(&mut self, transaction: CanonicalTransaction) -> MergeOutcome {
        if !self.keys.insert(transaction.dedup_key()) {
            return MergeOutcome::Duplicate;
        }

        self.version += 1;

        if self.tracking_live {
            self.live.push((self.version, transaction.clone()));
        }

        self.records.insert(0, transaction);

        MergeOutcome::Inserted
    }

    /// Replaces the set with a fetched snapshot.
    ///
    /// Records merged live after `since_version` (i.e. while the fetch was in flight) are kept
    /// at the head unless the snapshot already carries them. Returns the number of snapshot
    /// duplicates that were discarded.
    pub fn replace_with_snapshot(&mut self, snapshot: Vec<CanonicalTransaction>, since_version: u64) -> usize {
        let mut keys = HashSet::with_capacity(snapshot.len());
        let mut records = Vec::with_capacity(snapshot.len());
        let mut duplicates = 0;

        for transaction in snapshot {
            if keys.insert(transaction.dedup_key()) {
                records.push(transaction);
            } else {
                duplicates += 1;
            }
        }

        for (_, transaction) in self.live.drain(..).filter(|(version, _)| *version > since_version) {
            if keys.insert(transaction.dedup_key()) {
                records.insert(0, transaction);
            }
        }

        self.records = records;
        self.keys = keys;
        self.tracking_live = false;
        self.version += 1;

        duplicates
    }
}
