//! Ledger of snapshots awaiting delivery acknowledgment.
//!
//! Retention is bounded by compaction rather than eviction: once the cap is
//! reached the two oldest snapshots are merged, so the ledger total never
//! changes and no unacknowledged event is dropped during a long outage.

use std::collections::VecDeque;

/// Snapshots that can be summed.
pub trait Merge: Clone + Default {
    fn merge(&mut self, other: &Self);
}

/// Retention settings for a metric's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Upper bound on retained snapshots (at least 1).
    pub max_snapshots: usize,
}

impl LedgerPolicy {
    /// One day of snapshots at the default 60s interval.
    pub const DEFAULT_MAX_SNAPSHOTS: usize = 1440;

    pub fn new(max_snapshots: usize) -> Self {
        Self {
            max_snapshots: max_snapshots.max(1),
        }
    }
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SNAPSHOTS)
    }
}

#[derive(Debug, Clone)]
pub struct Ledger<S> {
    snapshots: VecDeque<S>,
    max_snapshots: usize,
}

impl<S: Merge> Ledger<S> {
    pub fn new(policy: LedgerPolicy) -> Self {
        Self {
            snapshots: VecDeque::new(),
            max_snapshots: policy.max_snapshots.max(1),
        }
    }

    /// Append a snapshot, compacting the oldest entries when over the cap.
    pub fn push(&mut self, snapshot: S) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.max_snapshots {
            let Some(oldest) = self.snapshots.pop_front() else {
                break;
            };
            let Some(next) = self.snapshots.front_mut() else {
                self.snapshots.push_front(oldest);
                break;
            };
            next.merge(&oldest);
        }
    }

    /// Sum of every retained snapshot.
    pub fn total(&self) -> S {
        let mut acc = S::default();
        for s in &self.snapshots {
            acc.merge(s);
        }
        acc
    }

    pub fn clear(&mut self) {
        self.snapshots = VecDeque::new();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
