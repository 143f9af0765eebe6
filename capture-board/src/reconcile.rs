//! Persisting committed drops and deciding how to settle them.
//!
//! Column order is the only ordering the dispatcher writes. Card moves are
//! handed to the host through [`BoardEvents::on_card_move`], which persists
//! stage changes through its own call.

use crate::api::BoardApi;
use crate::events::BoardEvents;
use crate::projection::RemoteProjection;
use crate::types::{BoardSnapshot, CardId, ColumnId};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// New server-side `order` for one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChange {
    pub column_id: ColumnId,
    pub order: u32,
}

/// Dense orders (`index + 1`) for every column in `committed` whose order
/// differs from the one it had in `pre_drag`.
pub fn order_changes(pre_drag: &BoardSnapshot, committed: &BoardSnapshot) -> Vec<OrderChange> {
    let previous: HashMap<&ColumnId, u32> =
        pre_drag.columns.iter().map(|c| (&c.id, c.order)).collect();

    committed
        .columns
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let order = index as u32 + 1;
            (previous.get(&column.id) != Some(&order)).then(|| OrderChange {
                column_id: column.id.clone(),
                order,
            })
        })
        .collect()
}

/// Rewrite every column's `order` as `index + 1`.
///
/// Applied to a committed column move before it is stored locally, so a
/// second move started before the first is confirmed diffs against the
/// orders the first one will write.
pub fn with_dense_orders(mut snapshot: BoardSnapshot) -> BoardSnapshot {
    for (index, column) in snapshot.columns.iter_mut().enumerate() {
        column.order = index as u32 + 1;
    }
    snapshot
}

/// What a committed drop changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileKind {
    Columns,
    Card {
        card_id: CardId,
        from: ColumnId,
        to: ColumnId,
    },
}

/// A committed drop awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Working-board revision this drop produced
    pub revision: u64,
    pub kind: ReconcileKind,
    pub pre_drag: BoardSnapshot,
    pub committed: BoardSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileResult {
    /// Server accepted the change; `orders` are the confirmed column orders
    Persisted { orders: Vec<OrderChange> },
    /// At least one call failed; writes that went through were reverted
    /// and nothing partial is kept locally
    Failed {
        message: String,
        pre_drag: BoardSnapshot,
    },
}

/// Result of persisting one [`Reconciliation`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub revision: u64,
    pub result: ReconcileResult,
}

impl ReconcileOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self.result, ReconcileResult::Persisted { .. })
    }
}

/// Persists committed drops through the [`BoardApi`].
pub struct ReconciliationDispatcher<A: BoardApi> {
    api: Arc<A>,
    projection: Arc<RemoteProjection<A>>,
    events: Arc<dyn BoardEvents>,
}

impl<A: BoardApi> Clone for ReconciliationDispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            projection: Arc::clone(&self.projection),
            events: Arc::clone(&self.events),
        }
    }
}

impl<A: BoardApi> ReconciliationDispatcher<A> {
    pub fn new(
        api: Arc<A>,
        projection: Arc<RemoteProjection<A>>,
        events: Arc<dyn BoardEvents>,
    ) -> Self {
        Self {
            api,
            projection,
            events,
        }
    }

    /// Persist a committed drop. Never fails: errors come back as
    /// [`ReconcileResult::Failed`] carrying the snapshot to restore.
    pub async fn persist(&self, reconciliation: Reconciliation) -> ReconcileOutcome {
        let Reconciliation {
            revision,
            kind,
            pre_drag,
            committed,
        } = reconciliation;

        let result = match kind {
            ReconcileKind::Columns => self.persist_columns(&pre_drag, &committed).await,
            ReconcileKind::Card { card_id, from, to } => {
                if from != to {
                    self.events.on_card_move(&card_id, &from, &to);
                }
                Ok(Vec::new())
            }
        };

        self.projection.invalidate().await;

        let result = match result {
            Ok(orders) => {
                tracing::info!(revision, updated = orders.len(), "reorder persisted");
                ReconcileResult::Persisted { orders }
            }
            Err(message) => {
                tracing::warn!(revision, error = %message, "reorder failed");
                ReconcileResult::Failed { message, pre_drag }
            }
        };
        ReconcileOutcome { revision, result }
    }

    async fn persist_columns(
        &self,
        pre_drag: &BoardSnapshot,
        committed: &BoardSnapshot,
    ) -> Result<Vec<OrderChange>, String> {
        let changes = order_changes(pre_drag, committed);
        let results = join_all(
            changes
                .iter()
                .map(|c| self.api.update_column_order(&c.column_id, c.order)),
        )
        .await;

        let mut written = Vec::new();
        let mut failures = Vec::new();
        for (change, result) in changes.iter().zip(results) {
            match result {
                Ok(()) => written.push(change),
                Err(e) => failures.push(format!("{}: {}", change.column_id, e)),
            }
        }

        if failures.is_empty() {
            return Ok(changes);
        }
        self.revert_orders(pre_drag, &written).await;
        Err(failures.join("; "))
    }

    /// Put the pre-drag order back on every column whose write went through
    /// before a sibling failed. Best effort: the engine resyncs afterwards.
    async fn revert_orders(&self, pre_drag: &BoardSnapshot, written: &[&OrderChange]) {
        let reverts: Vec<OrderChange> = written
            .iter()
            .filter_map(|change| {
                pre_drag.column(&change.column_id).map(|c| OrderChange {
                    column_id: c.id.clone(),
                    order: c.order,
                })
            })
            .collect();
        if reverts.is_empty() {
            return;
        }

        let results = join_all(
            reverts
                .iter()
                .map(|c| self.api.update_column_order(&c.column_id, c.order)),
        )
        .await;
        for (revert, result) in reverts.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(column = %revert.column_id, error = %e, "could not revert column order");
            }
        }
    }
}
