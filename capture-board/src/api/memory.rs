//! In-memory [`BoardApi`] with call recording and failure injection.

use super::{ApiResult, BoardApi};
use crate::error::ApiError;
use crate::types::{BoardSnapshot, CardId, Column, ColumnId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// A call received by [`InMemoryBoardApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchBoard,
    UpdateColumnOrder { id: ColumnId, order: u32 },
    CreateColumn { title: String, order: u32 },
    DeleteColumn { id: ColumnId },
    DeleteCard { id: CardId },
    MoveCard { card: CardId, column: ColumnId },
}

#[derive(Debug, Default)]
struct State {
    board: BoardSnapshot,
    calls: Vec<ApiCall>,
    fail_writes: bool,
    fail_fetch: bool,
    rejected_columns: HashSet<ColumnId>,
    next_id: u32,
}

/// Server stand-in that keeps the board in memory.
#[derive(Debug, Default)]
pub struct InMemoryBoardApi {
    state: Mutex<State>,
    identity: Option<String>,
}

impl InMemoryBoardApi {
    pub fn new(board: BoardSnapshot) -> Self {
        Self {
            state: Mutex::new(State {
                board,
                ..State::default()
            }),
            identity: None,
        }
    }

    pub fn with_identity(mut self, user: impl Into<String>) -> Self {
        self.identity = Some(user.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Server-side board as it stands now
    pub fn board(&self) -> BoardSnapshot {
        self.lock().board.clone()
    }

    /// Replace the server-side board, as another session would
    pub fn set_board(&self, board: BoardSnapshot) {
        self.lock().board = board;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls other than reads
    pub fn write_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| *c != ApiCall::FetchBoard)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every write fail with a 503
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.lock().fail_fetch = fail;
    }

    /// Reject order updates for one column with a conflict
    pub fn reject_column(&self, id: impl Into<ColumnId>) {
        self.lock().rejected_columns.insert(id.into());
    }

    fn write(&self, call: ApiCall) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_writes {
            return Err(unavailable());
        }
        Ok(state)
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "service unavailable".into(),
    }
}

fn column_not_found(id: &ColumnId) -> ApiError {
    ApiError::NotFound(format!("stage {id} not found"))
}

#[async_trait]
impl BoardApi for InMemoryBoardApi {
    async fn fetch_board(&self) -> ApiResult<BoardSnapshot> {
        let mut state = self.lock();
        state.calls.push(ApiCall::FetchBoard);
        if state.fail_fetch {
            return Err(unavailable());
        }
        Ok(BoardSnapshot::sorted_by_order(state.board.columns.clone()))
    }

    async fn update_column_order(&self, id: &ColumnId, order: u32) -> ApiResult<()> {
        let mut state = self.write(ApiCall::UpdateColumnOrder {
            id: id.clone(),
            order,
        })?;
        if state.rejected_columns.contains(id) {
            return Err(ApiError::Conflict(format!("stage {id} changed")));
        }
        let column = state
            .board
            .columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| column_not_found(id))?;
        column.order = order;
        Ok(())
    }

    async fn create_column(&self, title: &str, order: u32) -> ApiResult<Column> {
        let mut state = self.write(ApiCall::CreateColumn {
            title: title.to_string(),
            order,
        })?;
        state.next_id += 1;
        let column = Column::new(format!("stage-{}", state.next_id), title, order);
        state.board.columns.push(column.clone());
        Ok(column)
    }

    async fn delete_column(&self, id: &ColumnId) -> ApiResult<()> {
        let mut state = self.write(ApiCall::DeleteColumn { id: id.clone() })?;
        let before = state.board.columns.len();
        state.board.columns.retain(|c| &c.id != id);
        if state.board.columns.len() == before {
            return Err(column_not_found(id));
        }
        Ok(())
    }

    async fn delete_card(&self, id: &CardId) -> ApiResult<()> {
        let mut state = self.write(ApiCall::DeleteCard { id: id.clone() })?;
        let mut found = false;
        for column in &mut state.board.columns {
            let before = column.cards.len();
            column.cards.retain(|c| &c.id != id);
            found |= column.cards.len() != before;
        }
        if !found {
            return Err(ApiError::NotFound(format!("acquisition {id} not found")));
        }
        Ok(())
    }

    async fn move_card_to_column(&self, card: &CardId, column: &ColumnId) -> ApiResult<()> {
        let mut state = self.write(ApiCall::MoveCard {
            card: card.clone(),
            column: column.clone(),
        })?;
        let dest = state
            .board
            .column_index(column)
            .ok_or_else(|| column_not_found(column))?;
        let (source, index) = state
            .board
            .locate_card(card)
            .map(|(col, idx)| (col.clone(), idx))
            .ok_or_else(|| ApiError::NotFound(format!("acquisition {card} not found")))?;
        if &source != column {
            let source = state.board.column_index(&source).unwrap_or_default();
            let moved = state.board.columns[source].cards.remove(index);
            state.board.columns[dest].cards.push(moved);
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        "memory://stages".to_string()
    }

    fn identity(&self) -> Option<String> {
        self.identity.clone()
    }
}
