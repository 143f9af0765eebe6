//! Remote board API consumed by the engine.
//!
//! The REST service owns stages (columns) and acquisitions (cards). The
//! engine only ever talks to it through [`BoardApi`], so hosts can swap the
//! HTTP implementation for an in-memory one.

mod http;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use crate::error::ApiError;
use crate::types::{BoardSnapshot, CardId, Column, ColumnId};
use async_trait::async_trait;

pub use http::HttpBoardApi;

/// Result type for remote calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[async_trait]
pub trait BoardApi: Send + Sync {
    /// All columns ordered by `order`, each with its cards.
    async fn fetch_board(&self) -> ApiResult<BoardSnapshot>;

    async fn update_column_order(&self, id: &ColumnId, order: u32) -> ApiResult<()>;

    async fn create_column(&self, title: &str, order: u32) -> ApiResult<Column>;

    /// Only valid for empty columns; callers check first.
    async fn delete_column(&self, id: &ColumnId) -> ApiResult<()>;

    async fn delete_card(&self, id: &CardId) -> ApiResult<()>;

    /// Move an acquisition to another stage.
    async fn move_card_to_column(&self, card: &CardId, column: &ColumnId) -> ApiResult<()>;

    /// Endpoint the board is read from; first half of the cache key.
    fn endpoint(&self) -> String;

    /// Signed-in user, if any; second half of the cache key.
    fn identity(&self) -> Option<String>;
}
