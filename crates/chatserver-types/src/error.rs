use thiserror::Error;

use crate::chat::{ChatId, UserId};

/// Entity name used in [`ChatError::NotFound`] for missing chats.
pub const CHAT_ENTITY: &str = "chat";

/// Errors produced by the chat repository, transaction manager, and service.
///
/// Lower-level persistence faults are flattened into [`ChatError::Storage`];
/// the remaining variants classify caller-visible conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Caller input violates a precondition.
    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("user {user_id} not found in chat {chat_id}")]
    UserNotInChat { user_id: UserId, chat_id: ChatId },

    /// Connection, statement, scan, or commit failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The unit of work was cancelled before it finished.
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ChatError {
    pub fn chat_not_found(chat_id: ChatId) -> Self {
        ChatError::NotFound {
            entity: CHAT_ENTITY,
            id: chat_id.0,
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        ChatError::Storage(err.to_string())
    }
}
