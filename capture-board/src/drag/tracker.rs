//! Drag session state machine.
//!
//! `Idle` is `session == None`. A session lives from `start` until exactly one
//! of `drop` or `cancel`, and owns the pre-drag snapshot for that whole span.

use super::item::{DragHandle, DragItem, HoverTarget, Placement};
use super::placement;
use crate::error::{BoardError, Result};
use crate::types::{BoardSnapshot, Point};

/// Transient state of one in-progress drag gesture.
#[derive(Debug, Clone)]
pub struct DragSession {
    item: DragItem,
    pre_drag: BoardSnapshot,
    /// Last resolved placement; `None` while the pointer is over no target.
    over: Option<Placement>,
}

impl DragSession {
    pub fn item(&self) -> &DragItem {
        &self.item
    }

    /// Snapshot captured at drag start, used for rollback
    pub fn pre_drag(&self) -> &BoardSnapshot {
        &self.pre_drag
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.over.as_ref()
    }

    fn update(&mut self, next: Placement) -> HoverOutcome {
        if self.over.as_ref() == Some(&next) {
            return HoverOutcome::Unchanged;
        }
        let preview = placement::apply(&self.pre_drag, &self.item, &next);
        tracing::debug!(item = ?self.item, placement = ?next, "drag placement changed");
        self.over = Some(next);
        HoverOutcome::Preview(preview)
    }

    /// Over a target the item cannot drop on: show the pre-drag board and
    /// let a drop cancel.
    fn clear(&mut self) -> HoverOutcome {
        match self.over.take() {
            Some(_) => HoverOutcome::Preview(self.pre_drag.clone()),
            None => HoverOutcome::Unchanged,
        }
    }
}

/// Result of re-evaluating a hover.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverOutcome {
    /// Placement did not change; nothing to re-render
    Unchanged,
    /// Replace the working snapshot with this one
    Preview(BoardSnapshot),
}

/// Result of ending a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Dropped on a valid target at a new position
    Committed {
        item: DragItem,
        placement: Placement,
        pre_drag: BoardSnapshot,
        committed: BoardSnapshot,
    },
    /// Dropped where it started
    Unchanged { pre_drag: BoardSnapshot },
    /// Dropped outside any target
    Cancelled { pre_drag: BoardSnapshot },
}

/// Converts drag events into board transformations.
#[derive(Debug, Default)]
pub struct DragTracker {
    session: Option<DragSession>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Begin a drag of `handle`, capturing `working` as the rollback point.
    pub fn start(&mut self, handle: DragHandle, working: &BoardSnapshot) -> Result<DragItem> {
        if self.session.is_some() {
            return Err(BoardError::DragInProgress);
        }

        let item = match handle {
            DragHandle::Card(id) => {
                let (column_id, index) =
                    working
                        .locate_card(&id)
                        .ok_or_else(|| BoardError::CardNotFound {
                            id: id.to_string(),
                        })?;
                DragItem::Card {
                    column_id: column_id.clone(),
                    index,
                    id,
                }
            }
            DragHandle::Column(id) => {
                let index = working
                    .column_index(&id)
                    .ok_or_else(|| BoardError::ColumnNotFound { id: id.to_string() })?;
                DragItem::Column { id, index }
            }
        };

        tracing::debug!(item = ?item, "drag started");
        self.session = Some(DragSession {
            item: item.clone(),
            pre_drag: working.clone(),
            over: None,
        });
        Ok(item)
    }

    /// Re-evaluate the placement for the pointer over `target`.
    pub fn hover(&mut self, target: &HoverTarget, pointer: Point) -> Result<HoverOutcome> {
        let session = self.session.as_mut().ok_or(BoardError::NoActiveDrag)?;
        match placement::resolve(&session.pre_drag, &session.item, target, pointer) {
            Some(next) => Ok(session.update(next)),
            None => Ok(session.clear()),
        }
    }

    /// Place the item directly, e.g. from keyboard input.
    pub fn place(&mut self, requested: Placement) -> Result<HoverOutcome> {
        let session = self.session.as_mut().ok_or(BoardError::NoActiveDrag)?;
        match placement::normalize(&session.pre_drag, &session.item, requested) {
            Some(next) => Ok(session.update(next)),
            None => Ok(HoverOutcome::Unchanged),
        }
    }

    /// The pointer left every drop target; a drop now cancels.
    pub fn leave(&mut self) -> Result<HoverOutcome> {
        let session = self.session.as_mut().ok_or(BoardError::NoActiveDrag)?;
        Ok(session.clear())
    }

    /// End the gesture, releasing the session.
    pub fn drop(&mut self) -> Result<DropOutcome> {
        let DragSession {
            item,
            pre_drag,
            over,
        } = self.session.take().ok_or(BoardError::NoActiveDrag)?;

        let outcome = match over {
            None => DropOutcome::Cancelled { pre_drag },
            Some(p) if p == item.origin() => DropOutcome::Unchanged { pre_drag },
            Some(p) => {
                let committed = placement::apply(&pre_drag, &item, &p);
                DropOutcome::Committed {
                    item,
                    placement: p,
                    pre_drag,
                    committed,
                }
            }
        };
        Ok(outcome)
    }

    /// Abort the gesture and hand back the pre-drag snapshot.
    pub fn cancel(&mut self) -> Option<BoardSnapshot> {
        let session = self.session.take()?;
        tracing::debug!(item = ?session.item, "drag cancelled");
        Some(session.pre_drag)
    }
}
