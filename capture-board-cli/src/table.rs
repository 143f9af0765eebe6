//! Board rendering for the terminal.

use capture_board::{BoardSnapshot, Card, CardKind};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

const MAX_TITLE: usize = 40;

pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Truncate a string to `max` characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn card_detail(card: &Card) -> String {
    match card.kind {
        CardKind::Property => card.address.clone().unwrap_or_default(),
        CardKind::Contact => card.subtitle.clone().unwrap_or_default(),
    }
}

/// One row per card, grouped by stage in board order. Empty stages get a
/// single row so they stay visible.
pub fn board_table(board: &BoardSnapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Order", "Stage", "Card", "Type", "Title", "Detail", "Status"]);

    for column in &board.columns {
        let stage = format!("{} ({})", column.title, column.id);
        if column.cards.is_empty() {
            table.add_row(vec![
                column.order.to_string(),
                stage,
                "-".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ]);
            continue;
        }
        for card in &column.cards {
            let kind = match card.kind {
                CardKind::Property => "property",
                CardKind::Contact => "contact",
            };
            table.add_row(vec![
                column.order.to_string(),
                stage.clone(),
                card.id.to_string(),
                kind.to_string(),
                truncate_str(&card.title, MAX_TITLE),
                truncate_str(&card_detail(card), MAX_TITLE),
                card.status.clone().unwrap_or_default(),
            ]);
        }
    }
    table
}
