//! Drag item, hover target and placement variants.

use crate::types::{Axis, CardId, ColumnId, Rect};
use serde::{Deserialize, Serialize};

/// What a gesture grabbed, by identifier only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragHandle {
    Card(CardId),
    Column(ColumnId),
}

/// The dragged element resolved against the pre-drag snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragItem {
    Card {
        id: CardId,
        column_id: ColumnId,
        index: usize,
    },
    Column {
        id: ColumnId,
        index: usize,
    },
}

impl DragItem {
    /// Placement that leaves the item where it started
    pub fn origin(&self) -> Placement {
        match self {
            Self::Card {
                column_id, index, ..
            } => Placement::Card {
                column_id: column_id.clone(),
                index: *index,
            },
            Self::Column { index, .. } => Placement::Column { index: *index },
        }
    }

    /// Axis siblings of this item are laid out along
    pub fn axis(&self) -> Axis {
        match self {
            Self::Card { .. } => Axis::Vertical,
            Self::Column { .. } => Axis::Horizontal,
        }
    }
}

/// A drop target under the pointer, with the geometry needed to decide
/// before/after.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverTarget {
    /// An existing card
    Card {
        id: CardId,
        column_id: ColumnId,
        bounds: Rect,
    },
    /// Empty space inside a column, no card under the pointer
    ColumnSpace { column_id: ColumnId },
    /// A column as a whole (header or frame)
    Column { id: ColumnId, bounds: Rect },
}

/// Where the dragged item would land. Indices address the destination
/// sequence after the dragged item has been removed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Card { column_id: ColumnId, index: usize },
    Column { index: usize },
}
