//! Pure, side-effect-free operations over a board snapshot

mod moves;

pub use moves::{move_across_columns, move_column, move_within_column};
