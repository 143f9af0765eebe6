//! Board-level types: BoardSnapshot, Column, Card

use super::ids::{CardId, ColumnId};
use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a card tracks through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Property,
    Contact,
}

/// A single lead being captured.
///
/// A card has no stored position; its ordinal is its index within the
/// owning column's `cards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Card {
    /// Create a property card
    pub fn property(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self::new(id, CardKind::Property, title)
    }

    /// Create a contact card
    pub fn contact(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self::new(id, CardKind::Contact, title)
    }

    fn new(id: impl Into<CardId>, kind: CardKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            address: None,
            subtitle: None,
            status: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// A column defines a pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    /// Create an empty column
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            cards: Vec::new(),
        }
    }

    /// Add cards in display order
    pub fn with_cards(mut self, cards: impl IntoIterator<Item = Card>) -> Self {
        self.cards.extend(cards);
        self
    }

    /// Index of a card within this column
    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// The full ordered list of columns, each with its ordered cards, at a point
/// in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub columns: Vec<Column>,
}

impl BoardSnapshot {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build a snapshot ordered by each column's `order`, as the server
    /// lists stages.
    pub fn sorted_by_order(mut columns: Vec<Column>) -> Self {
        columns.sort_by_key(|c| c.order);
        Self { columns }
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    /// Find the column holding a card and the card's index in it
    pub fn locate_card(&self, id: &CardId) -> Option<(&ColumnId, usize)> {
        self.columns
            .iter()
            .find_map(|col| col.card_index(id).map(|idx| (&col.id, idx)))
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .find(|c| &c.id == id)
    }

    /// All card identifiers across the board, in display order
    pub fn card_ids(&self) -> Vec<CardId> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter().map(|card| card.id.clone()))
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Next `order` value for a column appended at the end
    pub fn next_order(&self) -> u32 {
        self.columns.iter().map(|c| c.order).max().map_or(1, |o| o + 1)
    }

    /// Check the identity invariants: column ids unique, card ids unique
    /// across the whole board, column orders unique.
    pub fn validate(&self) -> Result<()> {
        let mut columns = HashSet::new();
        let mut orders = HashSet::new();
        let mut cards = HashSet::new();

        for col in &self.columns {
            if !columns.insert(&col.id) {
                return Err(BoardError::invalid_snapshot(format!(
                    "duplicate column id {}",
                    col.id
                )));
            }
            if !orders.insert(col.order) {
                return Err(BoardError::invalid_snapshot(format!(
                    "duplicate column order {}",
                    col.order
                )));
            }
            for card in &col.cards {
                if !cards.insert(&card.id) {
                    return Err(BoardError::invalid_snapshot(format!(
                        "duplicate card id {}",
                        card.id
                    )));
                }
            }
        }
        Ok(())
    }
}
