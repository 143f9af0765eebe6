//! Read-through cache of the server-confirmed board.
//!
//! One projection per `(endpoint, identity)` key, shared by cloning the
//! `Arc`. Consuming views call [`RemoteProjection::mount`] to revalidate;
//! writers call [`RemoteProjection::invalidate`] on the projection they
//! touched rather than through any global key registry.

use crate::api::BoardApi;
use crate::error::ApiError;
use crate::types::BoardSnapshot;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Cache key of a projection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub endpoint: String,
    pub identity: Option<String>,
}

/// Current state of the projection, as shown to a consuming view.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionState {
    /// Never fetched
    Idle,
    /// First fetch in flight
    Loading,
    Ready {
        snapshot: BoardSnapshot,
        fetched_at: DateTime<Utc>,
        /// Invalidated since the fetch; the next read goes to the server
        stale: bool,
    },
    /// Last fetch failed; `last` is the previous good snapshot, if any
    Failed {
        message: String,
        last: Option<BoardSnapshot>,
    },
}

impl ProjectionState {
    /// Best snapshot available in this state
    pub fn snapshot(&self) -> Option<&BoardSnapshot> {
        match self {
            Self::Ready { snapshot, .. } => Some(snapshot),
            Self::Failed { last, .. } => last.as_ref(),
            Self::Idle | Self::Loading => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Fetch failure surfaced to the consuming view
#[derive(Debug, Error)]
#[error("failed to load board from {endpoint}: {source}")]
pub struct ProjectionError {
    pub endpoint: String,
    #[source]
    pub source: ApiError,
}

pub struct RemoteProjection<A: BoardApi> {
    api: Arc<A>,
    key: ProjectionKey,
    state: RwLock<ProjectionState>,
    /// Bumped by every invalidation; a fetch that started under an older
    /// generation lands as stale.
    generation: AtomicU64,
}

impl<A: BoardApi> RemoteProjection<A> {
    pub fn new(api: Arc<A>) -> Self {
        let key = ProjectionKey {
            endpoint: api.endpoint(),
            identity: api.identity(),
        };
        Self {
            api,
            key,
            state: RwLock::new(ProjectionState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &ProjectionKey {
        &self.key
    }

    pub async fn state(&self) -> ProjectionState {
        self.state.read().await.clone()
    }

    /// Cached snapshot without touching the network
    pub async fn snapshot(&self) -> Option<BoardSnapshot> {
        self.state.read().await.snapshot().cloned()
    }

    /// Revalidate on mount of a consuming view.
    pub async fn mount(&self) -> Result<BoardSnapshot, ProjectionError> {
        self.refetch().await
    }

    /// Serve the cached snapshot, fetching when there is none or it is stale.
    pub async fn read(&self) -> Result<BoardSnapshot, ProjectionError> {
        {
            let state = self.state.read().await;
            if let ProjectionState::Ready {
                snapshot,
                stale: false,
                ..
            } = &*state
            {
                return Ok(snapshot.clone());
            }
        }
        self.refetch().await
    }

    /// Mark the cached snapshot stale so the next read bypasses it.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if let ProjectionState::Ready { stale, .. } = &mut *state {
            *stale = true;
        }
        tracing::debug!(endpoint = %self.key.endpoint, "projection invalidated");
    }

    /// Fetch from the server unconditionally.
    pub async fn refetch(&self) -> Result<BoardSnapshot, ProjectionError> {
        let generation = self.generation.load(Ordering::SeqCst);
        {
            let mut state = self.state.write().await;
            if matches!(*state, ProjectionState::Idle) {
                *state = ProjectionState::Loading;
            }
        }

        let result = self.api.fetch_board().await;
        let mut state = self.state.write().await;
        match result {
            Ok(snapshot) => {
                let stale = self.generation.load(Ordering::SeqCst) != generation;
                *state = ProjectionState::Ready {
                    snapshot: snapshot.clone(),
                    fetched_at: Utc::now(),
                    stale,
                };
                tracing::debug!(
                    endpoint = %self.key.endpoint,
                    columns = snapshot.columns.len(),
                    stale,
                    "board fetched"
                );
                Ok(snapshot)
            }
            Err(source) => {
                let last = state.snapshot().cloned();
                tracing::warn!(endpoint = %self.key.endpoint, error = %source, "board fetch failed");
                *state = ProjectionState::Failed {
                    message: source.to_string(),
                    last,
                };
                Err(ProjectionError {
                    endpoint: self.key.endpoint.clone(),
                    source,
                })
            }
        }
    }
}
