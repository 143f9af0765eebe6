//! The locally-held working snapshot.
//!
//! Every preview and drop replaces the snapshot synchronously; there is no
//! network call and no debouncing between a drag event and the new state.

use crate::reconcile::OrderChange;
use crate::types::BoardSnapshot;

/// Working board state owned by the hosting view.
#[derive(Debug, Clone, Default)]
pub struct WorkingBoard {
    snapshot: BoardSnapshot,
    revision: u64,
}

impl WorkingBoard {
    pub fn new(snapshot: BoardSnapshot) -> Self {
        Self {
            snapshot,
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    /// Revision of the latest committed local change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap the whole snapshot, e.g. with a drag preview.
    pub fn replace(&mut self, snapshot: BoardSnapshot) {
        self.snapshot = snapshot;
    }

    /// Record a committed local change and return its revision.
    pub fn commit(&mut self, snapshot: BoardSnapshot) -> u64 {
        self.snapshot = snapshot;
        self.revision += 1;
        self.revision
    }

    /// Reinstate a snapshot after a failed or cancelled change.
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        self.snapshot = snapshot;
    }

    /// Write server-confirmed column orders, matched by column id.
    pub fn apply_orders(&mut self, changes: &[OrderChange]) {
        for change in changes {
            if let Some(col) = self
                .snapshot
                .columns
                .iter_mut()
                .find(|c| c.id == change.column_id)
            {
                col.order = change.order;
            }
        }
    }

    /// Mutable access for local removals after server-acknowledged deletes.
    pub(crate) fn snapshot_mut(&mut self) -> &mut BoardSnapshot {
        &mut self.snapshot
    }
}
