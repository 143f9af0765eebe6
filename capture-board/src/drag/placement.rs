//! Insertion-index arithmetic.
//!
//! Everything here is computed against the pre-drag baseline, never against
//! a previously previewed snapshot, so repeated hovers cannot drift.

use super::item::{DragItem, HoverTarget, Placement};
use crate::board::{move_across_columns, move_column, move_within_column};
use crate::types::{BoardSnapshot, ColumnId, Point};

/// Resolve the placement for `item` hovering `target` at `pointer`.
///
/// Returns `None` when the target does not apply to the dragged item (a
/// column dragged over a card, or an id that is not on the baseline).
pub fn resolve(
    baseline: &BoardSnapshot,
    item: &DragItem,
    target: &HoverTarget,
    pointer: Point,
) -> Option<Placement> {
    let axis = item.axis();
    match (item, target) {
        (
            DragItem::Card {
                id,
                column_id: source,
                index: from,
            },
            HoverTarget::Card {
                id: hovered, bounds, ..
            },
        ) => {
            if hovered == id {
                return Some(item.origin());
            }
            let (column_id, at) = baseline.locate_card(hovered)?;
            let at = index_without_source(at, *from, column_id == source);
            let index = at + usize::from(bounds.is_past_midpoint(pointer, axis));
            Some(Placement::Card {
                column_id: column_id.clone(),
                index,
            })
        }
        (
            DragItem::Card {
                column_id: source, ..
            },
            HoverTarget::ColumnSpace { column_id } | HoverTarget::Column { id: column_id, .. },
        ) => append_card(baseline, source, column_id),
        (DragItem::Column { id, index: from }, HoverTarget::Column { id: hovered, bounds }) => {
            if hovered == id {
                return Some(item.origin());
            }
            let at = baseline.column_index(hovered)?;
            let at = index_without_source(at, *from, true);
            let index = at + usize::from(bounds.is_past_midpoint(pointer, axis));
            Some(Placement::Column { index })
        }
        (DragItem::Column { .. }, HoverTarget::Card { .. } | HoverTarget::ColumnSpace { .. }) => {
            None
        }
    }
}

/// Clamp a programmatic placement into range for `item`.
///
/// Returns `None` for a placement of the wrong kind or an unknown column.
pub fn normalize(
    baseline: &BoardSnapshot,
    item: &DragItem,
    placement: Placement,
) -> Option<Placement> {
    match (item, placement) {
        (DragItem::Card { column_id: source, .. }, Placement::Card { column_id, index }) => {
            let len = destination_len(baseline, source, &column_id)?;
            Some(Placement::Card {
                column_id,
                index: index.min(len),
            })
        }
        (DragItem::Column { .. }, Placement::Column { index }) => Some(Placement::Column {
            index: index.min(baseline.columns.len().saturating_sub(1)),
        }),
        _ => None,
    }
}

/// Build the snapshot that results from placing `item` at `placement`.
///
/// Placing an item at its origin returns the baseline unchanged.
pub fn apply(baseline: &BoardSnapshot, item: &DragItem, placement: &Placement) -> BoardSnapshot {
    if *placement == item.origin() {
        return baseline.clone();
    }
    match (item, placement) {
        (
            DragItem::Card {
                id,
                column_id: source,
                index: from,
            },
            Placement::Card { column_id, index },
        ) => {
            if column_id == source {
                move_within_column(baseline, source, *from, *index)
            } else {
                move_across_columns(baseline, id, source, column_id, *index)
            }
        }
        (DragItem::Column { index: from, .. }, Placement::Column { index }) => {
            move_column(baseline, *from, *index)
        }
        _ => baseline.clone(),
    }
}

/// Index of a sibling once the source has been lifted out of the same
/// sequence.
fn index_without_source(at: usize, from: usize, same_sequence: bool) -> usize {
    if same_sequence && at > from {
        at - 1
    } else {
        at
    }
}

/// Length of the destination column with the dragged card removed.
fn destination_len(
    baseline: &BoardSnapshot,
    source: &ColumnId,
    dest: &ColumnId,
) -> Option<usize> {
    let len = baseline.column(dest)?.cards.len();
    Some(if dest == source { len.saturating_sub(1) } else { len })
}

fn append_card(baseline: &BoardSnapshot, source: &ColumnId, dest: &ColumnId) -> Option<Placement> {
    let index = destination_len(baseline, source, dest)?;
    Some(Placement::Card {
        column_id: dest.clone(),
        index,
    })
}
