//! Events raised to the hosting application, and user-facing notices.

use crate::types::{CardId, ColumnId};
use std::collections::VecDeque;

/// Callbacks consumed by the hosting application.
///
/// Both fire after local state has already been updated.
pub trait BoardEvents: Send + Sync {
    /// A card was dropped into a different column.
    fn on_card_move(&self, _card: &CardId, _from: &ColumnId, _to: &ColumnId) {}

    /// A card deletion was acknowledged by the server.
    fn on_card_delete(&self, _card: &CardId, _column: &ColumnId) {}
}

/// Host that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl BoardEvents for NoopEvents {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dismissable, non-fatal message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// Queue of notices awaiting dismissal
#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
    next_id: u64,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let notice = Notice {
            id: self.next_id,
            level,
            message: message.into(),
        };
        match level {
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
            NoticeLevel::Warning => tracing::warn!(message = %notice.message, "notice"),
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
        }
        self.queue.push_back(notice);
        self.next_id
    }

    pub fn warn(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message)
    }

    /// Remove a notice; returns whether it was present
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.queue.len();
        self.queue.retain(|n| n.id != id);
        self.queue.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every pending notice
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismiss() {
        let mut notices = Notices::default();
        let first = notices.warn("could not reorder, try again");
        let second = notices.error("could not delete card");
        assert_ne!(first, second);
        assert!(notices.dismiss(first));
        assert!(!notices.dismiss(first));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices.drain()[0].level, NoticeLevel::Error);
        assert!(notices.is_empty());
    }
}
