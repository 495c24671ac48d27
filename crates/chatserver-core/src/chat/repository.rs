//! ChatRepository trait definition.
//!
//! Every operation takes the executor to run against: a plain pool connection
//! or the connection of an open transaction. The repository never opens,
//! commits, or rolls back a transaction itself.

use std::future::Future;

use chatserver_types::chat::{ChatId, NewMessage, UserId};
use chatserver_types::error::ChatError;

/// Repository trait for chat, membership, and message persistence.
///
/// Implementations live in chatserver-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Handle statements are executed against.
    type Executor: Send;

    /// Insert a chat and one membership row per distinct user; returns the
    /// generated ID.
    ///
    /// All inserts run on `exec`, so the caller's transaction covers them.
    /// Fails with `ChatError::Validation` when `user_ids` is empty.
    fn create(
        &self,
        exec: &mut Self::Executor,
        user_ids: &[UserId],
    ) -> impl Future<Output = Result<ChatId, ChatError>> + Send;

    /// Delete all memberships of a chat, then the chat itself.
    ///
    /// Deleting an unknown chat succeeds without affecting any rows.
    fn delete(
        &self,
        exec: &mut Self::Executor,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Fails with `ChatError::NotFound` when no chat has this ID.
    fn exists(
        &self,
        exec: &mut Self::Executor,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Fails with `ChatError::UserNotInChat` when the user is not a member.
    fn is_member(
        &self,
        exec: &mut Self::Executor,
        user_id: UserId,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Check that the chat exists and the sender is a member, then append the
    /// message with a send timestamp captured at call time (UTC).
    fn send_message(
        &self,
        exec: &mut Self::Executor,
        message: &NewMessage,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;
}
