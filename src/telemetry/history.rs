//! Bounded, newest-first retention of past snapshots.

use std::collections::VecDeque;
use std::sync::Arc;

use super::snapshot::Snapshot;

/// Default number of snapshots to keep.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Fixed-capacity history of snapshots, most recent at the head.
///
/// Eviction is by arrival order: once full, each append drops the oldest
/// entry from the tail. Stored entries are shared and never modified.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Arc<Snapshot>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a new snapshot at the head, evicting from the tail if full.
    pub fn append(&mut self, snapshot: Arc<Snapshot>) {
        self.entries.push_front(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently appended snapshot.
    pub fn latest(&self) -> Option<&Arc<Snapshot>> {
        self.entries.front()
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Snapshot>> {
        self.entries.iter()
    }

    /// Copy out the entries, newest first.
    pub fn to_ordered_vec(&self) -> Vec<Arc<Snapshot>> {
        self.entries.iter().cloned().collect()
    }
}
