//! Removal/reinsertion moves for cards and columns.
//!
//! Every function takes a snapshot by reference and returns a new one. The
//! destination index is an index into the sequence *after* the moved element
//! has been removed, and is clamped into range. Unknown ids leave the
//! snapshot unchanged; callers check existence first.

use crate::types::{BoardSnapshot, CardId, ColumnId};

/// Remove `items[from]` and reinsert it at `to`, both clamped.
fn reinsert<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if items.is_empty() {
        return;
    }
    let last = items.len() - 1;
    let from = from.min(last);
    let to = to.min(last);
    if from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Move a card inside one column from `from_index` to `to_index`.
pub fn move_within_column(
    snapshot: &BoardSnapshot,
    column_id: &ColumnId,
    from_index: usize,
    to_index: usize,
) -> BoardSnapshot {
    let mut next = snapshot.clone();
    if let Some(column) = next.columns.iter_mut().find(|c| &c.id == column_id) {
        reinsert(&mut column.cards, from_index, to_index);
    }
    next
}

/// Move a card out of `source` and into `dest` at `insert_index`, clamped to
/// `[0, dest.len()]`. When `source == dest` this is a within-column move.
pub fn move_across_columns(
    snapshot: &BoardSnapshot,
    card_id: &CardId,
    source: &ColumnId,
    dest: &ColumnId,
    insert_index: usize,
) -> BoardSnapshot {
    let Some(from_index) = snapshot.column(source).and_then(|c| c.card_index(card_id)) else {
        return snapshot.clone();
    };
    if source == dest {
        return move_within_column(snapshot, source, from_index, insert_index);
    }
    let Some(dest_index) = snapshot.column_index(dest) else {
        return snapshot.clone();
    };

    let mut next = snapshot.clone();
    let Some(source_col) = next.columns.iter_mut().find(|c| &c.id == source) else {
        return snapshot.clone();
    };
    let card = source_col.cards.remove(from_index);

    let dest_col = &mut next.columns[dest_index];
    let at = insert_index.min(dest_col.cards.len());
    dest_col.cards.insert(at, card);
    next
}

/// Move a column from `from_index` to `to_index` in the column sequence.
///
/// Only the sequence changes; `order` values are rewritten when the move is
/// committed.
pub fn move_column(snapshot: &BoardSnapshot, from_index: usize, to_index: usize) -> BoardSnapshot {
    let mut next = snapshot.clone();
    reinsert(&mut next.columns, from_index, to_index);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, Column};

    fn titles(snapshot: &BoardSnapshot, column: &str) -> Vec<String> {
        snapshot
            .column(&column.into())
            .unwrap()
            .cards
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    fn board() -> BoardSnapshot {
        BoardSnapshot::new(vec![
            Column::new("colX", "Prospecting", 1).with_cards([
                Card::property("card1", "One"),
                Card::property("card2", "Two"),
                Card::contact("card3", "Three"),
            ]),
            Column::new("colY", "Visit", 2),
            Column::new("colZ", "Proposal", 3).with_cards([Card::contact("card4", "Four")]),
        ])
    }

    #[test]
    fn test_move_within_column_same_index_is_identity() {
        let board = board();
        for i in 0..3 {
            assert_eq!(move_within_column(&board, &"colX".into(), i, i), board);
        }
    }

    #[test]
    fn test_move_within_column_down_and_up() {
        let board = board();
        let down = move_within_column(&board, &"colX".into(), 0, 2);
        assert_eq!(titles(&down, "colX"), ["card2", "card3", "card1"]);

        let up = move_within_column(&board, &"colX".into(), 2, 0);
        assert_eq!(titles(&up, "colX"), ["card3", "card1", "card2"]);
    }

    #[test]
    fn test_move_within_column_clamps_indices() {
        let board = board();
        let moved = move_within_column(&board, &"colX".into(), 0, 99);
        assert_eq!(titles(&moved, "colX"), ["card2", "card3", "card1"]);
    }

    #[test]
    fn test_move_across_columns_into_empty() {
        let board = board();
        let moved = move_across_columns(&board, &"card1".into(), &"colX".into(), &"colY".into(), 0);
        assert_eq!(titles(&moved, "colX"), ["card2", "card3"]);
        assert_eq!(titles(&moved, "colY"), ["card1"]);
    }

    #[test]
    fn test_move_across_columns_clamps_insert_index() {
        let board = board();
        let moved =
            move_across_columns(&board, &"card2".into(), &"colX".into(), &"colZ".into(), 42);
        assert_eq!(titles(&moved, "colZ"), ["card4", "card2"]);
    }

    #[test]
    fn test_move_across_columns_unknown_ids_are_noops() {
        let board = board();
        let wrong_source =
            move_across_columns(&board, &"card4".into(), &"colX".into(), &"colY".into(), 0);
        assert_eq!(wrong_source, board);
        let missing_dest =
            move_across_columns(&board, &"card1".into(), &"colX".into(), &"nope".into(), 0);
        assert_eq!(missing_dest, board);
    }

    #[test]
    fn test_move_column() {
        let board = board();
        let moved = move_column(&board, 0, 2);
        let ids: Vec<_> = moved.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["colY", "colZ", "colX"]);
        // order values are untouched until reconciliation
        assert_eq!(moved.columns[2].order, 1);
    }
}
