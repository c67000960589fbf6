//! Rule-list history
//!
//! A bounded stack of full rule-list snapshots with a cursor. Snapshots
//! below the cursor are undo states; those at or above it are redo states.
//!
//! Undo and redo exchange the live list with the snapshot they restore, so
//! the vacated slot always holds the state that was just replaced. That is
//! what lets redo after undo reproduce the pre-undo list exactly.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::rules::Rule;

/// Maximum number of snapshots kept.
pub const MAX_HISTORY_DEPTH: usize = 32;

/// One saved rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub rules: Vec<Rule>,

    /// When the slot was last written.
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            taken_at: Utc::now(),
        }
    }

    /// Time since the slot was last written.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.taken_at)
    }
}

/// Bounded snapshot stack with a cursor.
///
/// Invariant: `cursor <= snapshots.len() <= max_depth`.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY_DEPTH)
    }
}

impl History {
    /// Create an empty history keeping at most `max_depth` snapshots.
    pub fn new(max_depth: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Save a copy of `rules` at the cursor.
    ///
    /// Discards every snapshot at or above the cursor first, evicts the
    /// oldest snapshots beyond the depth limit, and leaves the cursor at the
    /// top.
    pub fn push(&mut self, rules: &[Rule]) {
        self.snapshots.truncate(self.cursor);
        self.snapshots.push(Snapshot::new(rules.to_vec()));
        if self.snapshots.len() > self.max_depth {
            let excess = self.snapshots.len() - self.max_depth;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len();
        debug!("History push: {} of {}", self.cursor, self.max_depth);
    }

    /// Exchange `live` with the snapshot below the cursor.
    ///
    /// Returns `false` (and leaves `live` alone) at the bottom.
    pub fn undo(&mut self, live: &mut Vec<Rule>) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.exchange(self.cursor, live);
        true
    }

    /// Exchange `live` with the snapshot at the cursor.
    ///
    /// Returns `false` (and leaves `live` alone) at the top.
    pub fn redo(&mut self, live: &mut Vec<Rule>) -> bool {
        if self.cursor == self.snapshots.len() {
            return false;
        }
        self.exchange(self.cursor, live);
        self.cursor += 1;
        true
    }

    fn exchange(&mut self, slot: usize, live: &mut Vec<Rule>) {
        let snapshot = &mut self.snapshots[slot];
        debug!(
            "Restoring snapshot {} ({} rules, saved at {}, {}ms ago)",
            slot,
            snapshot.rules.len(),
            snapshot.taken_at.format("%H:%M:%S"),
            snapshot.age().num_milliseconds()
        );
        std::mem::swap(&mut snapshot.rules, live);
        snapshot.taken_at = Utc::now();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.snapshots.len()
    }

    /// Number of stored snapshots
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}
