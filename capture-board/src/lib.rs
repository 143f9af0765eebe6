//! Ordered-board reconciliation engine for the lead capture pipeline
//!
//! Stages are columns and acquisitions are cards. The server owns the board;
//! this crate keeps a working copy that reacts to drag gestures instantly and
//! reconciles with the server afterwards, rolling back when it must.
//!
//! ## Overview
//!
//! - **Board model** ([`board`]) - pure move functions over a [`BoardSnapshot`]
//! - **Drag tracking** ([`drag`]) - hover/drop events to placements, always
//!   computed from the pre-drag snapshot
//! - **Working board** ([`working`]) - the optimistic local snapshot
//! - **Reconciliation** ([`reconcile`]) - minimal column-order writes, card
//!   move callbacks, rollback data on failure
//! - **Remote projection** ([`projection`]) - read-through cache of the
//!   server board with explicit invalidation
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use capture_board::{BoardEngine, ClientConfig, HttpBoardApi};
//! use capture_board::drag::{DragHandle, HoverTarget};
//! use capture_board::types::{Point, Rect};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load(None)?;
//! let mut engine = BoardEngine::new(Arc::new(HttpBoardApi::new(&config)?));
//! engine.mount().await?;
//!
//! engine.begin_drag(DragHandle::Column("visit".into()))?;
//! engine.drag_over(
//!     &HoverTarget::Column {
//!         id: "prospecting".into(),
//!         bounds: Rect::new(0.0, 0.0, 280.0, 600.0),
//!     },
//!     Point::new(40.0, 100.0),
//! )?;
//! if let Some(outcome) = engine.drop_and_reconcile().await? {
//!     println!("persisted: {}", outcome.is_persisted());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod board;
mod config;
pub mod drag;
mod engine;
mod error;
pub mod events;
pub mod projection;
pub mod reconcile;
pub mod types;
pub mod working;

pub use api::{ApiResult, BoardApi, HttpBoardApi};
pub use config::{ClientConfig, DEFAULT_BASE_URL, ENV_PREFIX};
pub use engine::BoardEngine;
pub use error::{ApiError, BoardError, Result};
pub use events::{BoardEvents, NoopEvents, Notice, NoticeLevel};
pub use projection::{ProjectionError, ProjectionKey, ProjectionState, RemoteProjection};
pub use reconcile::{
    order_changes, OrderChange, ReconcileKind, ReconcileOutcome, ReconcileResult,
    Reconciliation, ReconciliationDispatcher,
};

// Re-export commonly used types
pub use types::{BoardSnapshot, Card, CardId, CardKind, Column, ColumnId};
