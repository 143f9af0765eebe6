//! Drag session tracking: turns hover/drop events into board snapshots

mod item;
pub mod placement;
mod tracker;

pub use item::{DragHandle, DragItem, HoverTarget, Placement};
pub use tracker::{DragSession, DragTracker, DropOutcome, HoverOutcome};
