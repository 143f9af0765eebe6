//! The board as held by one consuming view.
//!
//! `BoardEngine` is the only writer of the working snapshot. Drag events
//! mutate it synchronously; persistence runs separately through the
//! dispatcher and comes back through [`BoardEngine::settle`].

use crate::api::BoardApi;
use crate::drag::{DragHandle, DragItem, DragSession, DragTracker, DropOutcome, HoverOutcome};
use crate::drag::{HoverTarget, Placement};
use crate::error::{BoardError, Result};
use crate::events::{BoardEvents, NoopEvents, Notices};
use crate::projection::{ProjectionError, RemoteProjection};
use crate::reconcile::{
    with_dense_orders, ReconcileKind, ReconcileOutcome, ReconcileResult, Reconciliation,
    ReconciliationDispatcher,
};
use crate::types::{BoardSnapshot, CardId, Column, ColumnId, Point};
use crate::working::WorkingBoard;
use std::collections::BTreeSet;
use std::sync::Arc;

const REORDER_FAILED: &str = "Could not reorder, try again";

pub struct BoardEngine<A: BoardApi> {
    api: Arc<A>,
    projection: Arc<RemoteProjection<A>>,
    dispatcher: ReconciliationDispatcher<A>,
    events: Arc<dyn BoardEvents>,
    working: WorkingBoard,
    tracker: DragTracker,
    /// Revisions handed to the dispatcher and not yet settled
    in_flight: BTreeSet<u64>,
    /// Highest revision settled so far
    last_settled: u64,
    /// A failure or a late confirmation left the working board out of step
    /// with the server
    needs_resync: bool,
    notices: Notices,
}

impl<A: BoardApi> BoardEngine<A> {
    /// Engine with its own projection and no event consumer.
    pub fn new(api: Arc<A>) -> Self {
        let projection = Arc::new(RemoteProjection::new(Arc::clone(&api)));
        Self::with_parts(api, projection, Arc::new(NoopEvents))
    }

    /// Engine sharing `projection` with other views and reporting to `events`.
    pub fn with_parts(
        api: Arc<A>,
        projection: Arc<RemoteProjection<A>>,
        events: Arc<dyn BoardEvents>,
    ) -> Self {
        let dispatcher = ReconciliationDispatcher::new(
            Arc::clone(&api),
            Arc::clone(&projection),
            Arc::clone(&events),
        );
        Self {
            api,
            projection,
            dispatcher,
            events,
            working: WorkingBoard::default(),
            tracker: DragTracker::new(),
            in_flight: BTreeSet::new(),
            last_settled: 0,
            needs_resync: false,
            notices: Notices::default(),
        }
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        self.working.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.working.revision()
    }

    pub fn projection(&self) -> &Arc<RemoteProjection<A>> {
        &self.projection
    }

    /// Handle for persisting reconciliations off the event loop
    pub fn dispatcher(&self) -> ReconciliationDispatcher<A> {
        self.dispatcher.clone()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.tracker.session()
    }

    pub fn is_dragging(&self) -> bool {
        self.tracker.is_dragging()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    // ── Remote projection ────────────────────────────────────────────

    /// Revalidate the projection and adopt the server board when idle.
    pub async fn mount(&mut self) -> std::result::Result<bool, ProjectionError> {
        let snapshot = self.projection.mount().await?;
        Ok(self.adopt_server(snapshot))
    }

    /// Read through the projection and adopt the server board when idle.
    pub async fn hydrate(&mut self) -> std::result::Result<bool, ProjectionError> {
        let snapshot = self.projection.read().await?;
        Ok(self.adopt_server(snapshot))
    }

    /// Replace the working snapshot with a server one, unless a drag or an
    /// unsettled reconciliation would be overwritten. Returns whether it
    /// was applied.
    pub fn adopt_server(&mut self, snapshot: BoardSnapshot) -> bool {
        if self.tracker.is_dragging() || !self.in_flight.is_empty() {
            tracing::debug!(
                dragging = self.tracker.is_dragging(),
                in_flight = self.in_flight.len(),
                "deferring server snapshot"
            );
            return false;
        }
        self.working.restore(snapshot);
        self.needs_resync = false;
        true
    }

    // ── Drag gesture ─────────────────────────────────────────────────

    pub fn begin_drag(&mut self, handle: DragHandle) -> Result<DragItem> {
        self.tracker.start(handle, self.working.snapshot())
    }

    /// Returns whether the working snapshot changed.
    pub fn drag_over(&mut self, target: &HoverTarget, pointer: Point) -> Result<bool> {
        let outcome = self.tracker.hover(target, pointer)?;
        Ok(self.show(outcome))
    }

    /// Returns whether the working snapshot changed.
    pub fn place(&mut self, placement: Placement) -> Result<bool> {
        let outcome = self.tracker.place(placement)?;
        Ok(self.show(outcome))
    }

    /// The pointer left every target; shows the pre-drag board again.
    /// Returns whether the working snapshot changed.
    pub fn drag_leave(&mut self) -> Result<bool> {
        let outcome = self.tracker.leave()?;
        Ok(self.show(outcome))
    }

    /// Abort the gesture, restoring the pre-drag snapshot exactly.
    pub fn cancel_drag(&mut self) -> bool {
        match self.tracker.cancel() {
            Some(pre_drag) => {
                self.working.restore(pre_drag);
                true
            }
            None => false,
        }
    }

    /// End the gesture. A move to a new position is committed locally and
    /// returned for persistence; anything else restores the pre-drag state.
    pub fn drop_drag(&mut self) -> Result<Option<Reconciliation>> {
        match self.tracker.drop()? {
            DropOutcome::Cancelled { pre_drag } | DropOutcome::Unchanged { pre_drag } => {
                self.working.restore(pre_drag);
                Ok(None)
            }
            DropOutcome::Committed {
                item,
                placement,
                pre_drag,
                committed,
            } => {
                let (kind, committed) = match (item, placement) {
                    (
                        DragItem::Card {
                            id,
                            column_id: from,
                            ..
                        },
                        Placement::Card { column_id: to, .. },
                    ) => (
                        ReconcileKind::Card {
                            card_id: id,
                            from,
                            to,
                        },
                        committed,
                    ),
                    _ => (ReconcileKind::Columns, with_dense_orders(committed)),
                };
                let revision = self.working.commit(committed.clone());
                self.in_flight.insert(revision);
                tracing::info!(revision, kind = ?kind, "drop committed locally");
                Ok(Some(Reconciliation {
                    revision,
                    kind,
                    pre_drag,
                    committed,
                }))
            }
        }
    }

    /// Apply a persistence outcome to the working board.
    ///
    /// A failure rolls back to its own pre-drag snapshot only if nothing
    /// newer has been committed and no drag is active. A confirmation that
    /// arrives after a newer revision was already settled is stale: the
    /// server may now hold the older order. Every failure and every stale
    /// confirmation flags the board for resync, and the next hydrate once
    /// nothing is in flight replaces it with the server's.
    pub fn settle(&mut self, outcome: ReconcileOutcome) {
        self.in_flight.remove(&outcome.revision);
        let superseded = outcome.revision < self.last_settled;
        self.last_settled = self.last_settled.max(outcome.revision);

        match outcome.result {
            ReconcileResult::Persisted { orders } if superseded && !orders.is_empty() => {
                tracing::warn!(
                    revision = outcome.revision,
                    last_settled = self.last_settled,
                    "reorder confirmed out of order, resync required"
                );
                self.needs_resync = true;
            }
            ReconcileResult::Persisted { orders } => {
                self.working.apply_orders(&orders);
            }
            ReconcileResult::Failed { message, pre_drag } => {
                let latest = outcome.revision == self.working.revision();
                if latest && !self.tracker.is_dragging() {
                    tracing::warn!(revision = outcome.revision, error = %message, "rolling back");
                    self.working.restore(pre_drag);
                } else {
                    tracing::warn!(
                        revision = outcome.revision,
                        current = self.working.revision(),
                        error = %message,
                        "stale reorder failure"
                    );
                }
                // Server orders are only known after a fresh read.
                self.needs_resync = true;
                self.notices.warn(REORDER_FAILED);
            }
        }
    }

    /// Drop, persist and settle in one step, then resync if required.
    pub async fn drop_and_reconcile(&mut self) -> Result<Option<ReconcileOutcome>> {
        let Some(reconciliation) = self.drop_drag()? else {
            return Ok(None);
        };
        let outcome = self.dispatcher.persist(reconciliation).await;
        self.settle(outcome.clone());
        self.resync_if_needed().await;
        Ok(Some(outcome))
    }

    /// Move a card without a pointer gesture, through the same drag path.
    pub async fn move_card(
        &mut self,
        card: &CardId,
        to: &ColumnId,
        index: Option<usize>,
    ) -> Result<Option<ReconcileOutcome>> {
        self.begin_drag(DragHandle::Card(card.clone()))?;
        let placed = self.place(Placement::Card {
            column_id: to.clone(),
            index: index.unwrap_or(usize::MAX),
        });
        if let Err(e) = placed {
            self.cancel_drag();
            return Err(e);
        }
        if self.tracker.session().and_then(|s| s.placement()).is_none() {
            self.cancel_drag();
            return Err(BoardError::ColumnNotFound { id: to.to_string() });
        }
        self.drop_and_reconcile().await
    }

    /// Move a column without a pointer gesture, through the same drag path.
    pub async fn move_column(
        &mut self,
        column: &ColumnId,
        index: usize,
    ) -> Result<Option<ReconcileOutcome>> {
        self.begin_drag(DragHandle::Column(column.clone()))?;
        if let Err(e) = self.place(Placement::Column { index }) {
            self.cancel_drag();
            return Err(e);
        }
        self.drop_and_reconcile().await
    }

    async fn resync_if_needed(&mut self) {
        if !self.needs_resync {
            return;
        }
        if let Err(e) = self.hydrate().await {
            tracing::warn!(error = %e, "resync after failed reorder did not complete");
        }
    }

    fn show(&mut self, outcome: HoverOutcome) -> bool {
        match outcome {
            HoverOutcome::Unchanged => false,
            HoverOutcome::Preview(snapshot) => {
                self.working.replace(snapshot);
                true
            }
        }
    }

    // ── CRUD ─────────────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<()> {
        if self.tracker.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        Ok(())
    }

    /// Create a column at the end of the board.
    pub async fn create_column(&mut self, title: &str) -> Result<Column> {
        self.ensure_idle()?;
        let order = self.working.snapshot().next_order();
        match self.api.create_column(title, order).await {
            Ok(column) => {
                let board = self.working.snapshot_mut();
                if board.column(&column.id).is_none() {
                    board.columns.push(column.clone());
                }
                self.projection.invalidate().await;
                tracing::info!(column = %column.id, order, "column created");
                Ok(column)
            }
            Err(e) => {
                self.notices.error(format!("Could not create column: {e}"));
                Err(e.into())
            }
        }
    }

    /// Delete an empty column. Non-empty columns are rejected before any
    /// network call.
    pub async fn delete_column(&mut self, id: &ColumnId) -> Result<()> {
        self.ensure_idle()?;
        let column = self
            .working
            .snapshot()
            .column(id)
            .ok_or_else(|| BoardError::ColumnNotFound { id: id.to_string() })?;
        if !column.is_empty() {
            let count = column.cards.len();
            self.notices
                .warn(format!("Move or delete the {count} cards in '{}' first", column.title));
            return Err(BoardError::ColumnNotEmpty {
                id: id.to_string(),
                count,
            });
        }

        if let Err(e) = self.api.delete_column(id).await {
            self.notices.error(format!("Could not delete column: {e}"));
            return Err(e.into());
        }
        self.working
            .snapshot_mut()
            .columns
            .retain(|c| &c.id != id);
        self.projection.invalidate().await;
        tracing::info!(column = %id, "column deleted");
        Ok(())
    }

    /// Delete a card on the server, then locally, then tell the host.
    pub async fn delete_card(&mut self, id: &CardId) -> Result<()> {
        self.ensure_idle()?;
        let column_id = self
            .working
            .snapshot()
            .locate_card(id)
            .map(|(col, _)| col.clone())
            .ok_or_else(|| BoardError::CardNotFound { id: id.to_string() })?;

        if let Err(e) = self.api.delete_card(id).await {
            self.notices.error(format!("Could not delete card: {e}"));
            return Err(e.into());
        }
        if let Some(column) = self
            .working
            .snapshot_mut()
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
        {
            column.cards.retain(|c| &c.id != id);
        }
        self.events.on_card_delete(id, &column_id);
        self.projection.invalidate().await;
        tracing::info!(card = %id, column = %column_id, "card deleted");
        Ok(())
    }
}
