//! Core types for the capture board engine

mod board;
mod geometry;
mod ids;

// Re-export all types
pub use board::{BoardSnapshot, Card, CardKind, Column};
pub use geometry::{Axis, Point, Rect};
pub use ids::{CardId, ColumnId};
