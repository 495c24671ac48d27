//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `chatserver-core` using sqlx. The repository
//! holds no pool: every statement runs on the connection it is handed, which is
//! the open transaction's connection when called through `ChatService`.

use std::collections::HashSet;

use chatserver_core::chat::repository::ChatRepository;
use chatserver_observe::db_attrs::statement_span;
use chatserver_types::chat::{ChatId, NewMessage, UserId};
use chatserver_types::error::ChatError;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{Instrument, debug};

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

const INSERT_CHAT: &str = "INSERT INTO chats (created_at) VALUES (?) RETURNING id";
const INSERT_CHAT_USERS: &str = "INSERT INTO chat_users (chat_id, user_id) ";
const DELETE_CHAT_USERS: &str = "DELETE FROM chat_users WHERE chat_id = ?";
const DELETE_CHAT: &str = "DELETE FROM chats WHERE id = ?";
const CHAT_EXISTS: &str = "SELECT 1 FROM chats WHERE id = ?";
const IS_MEMBER: &str = "SELECT 1 FROM chat_users WHERE chat_id = ? AND user_id = ?";
const INSERT_MESSAGE: &str =
    "INSERT INTO messages (chat_id, from_user, text, sent_at) VALUES (?, ?, ?, ?)";

/// Membership rows per INSERT. Each row binds two variables and SQLite caps a
/// statement at 32,766.
const MEMBERSHIP_ROWS_PER_INSERT: usize = 16_383;

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteChatRepository;

impl SqliteChatRepository {
    pub fn new() -> Self {
        Self
    }
}

/// Drop repeated IDs, keeping first-seen order.
fn distinct_users(user_ids: &[UserId]) -> Vec<UserId> {
    let mut seen = HashSet::with_capacity(user_ids.len());
    user_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl ChatRepository for SqliteChatRepository {
    type Executor = SqliteConnection;

    async fn create(
        &self,
        exec: &mut SqliteConnection,
        user_ids: &[UserId],
    ) -> Result<ChatId, ChatError> {
        if user_ids.is_empty() {
            return Err(ChatError::Validation(
                "no users provided for the chat".to_string(),
            ));
        }

        let created_at = format_datetime(&Utc::now());
        let chat_id: i64 = sqlx::query_scalar(INSERT_CHAT)
            .bind(&created_at)
            .fetch_one(&mut *exec)
            .instrument(statement_span("chat_repository.create", INSERT_CHAT))
            .await
            .map_err(|e| ChatError::storage(format!("insert chat: {e}")))?;

        let members = distinct_users(user_ids);
        for chunk in members.chunks(MEMBERSHIP_ROWS_PER_INSERT) {
            let mut builder = QueryBuilder::<Sqlite>::new(INSERT_CHAT_USERS);
            builder.push_values(chunk, |mut row, user_id| {
                row.push_bind(chat_id).push_bind(user_id.0);
            });
            builder
                .build()
                .execute(&mut *exec)
                .instrument(statement_span(
                    "chat_repository.create_chat_users",
                    INSERT_CHAT_USERS,
                ))
                .await
                .map_err(|e| ChatError::storage(format!("insert chat users: {e}")))?;
        }

        debug!(chat_id, members = members.len(), "chat rows inserted");
        Ok(ChatId(chat_id))
    }

    async fn delete(&self, exec: &mut SqliteConnection, chat_id: ChatId) -> Result<(), ChatError> {
        let memberships = sqlx::query(DELETE_CHAT_USERS)
            .bind(chat_id.0)
            .execute(&mut *exec)
            .instrument(statement_span(
                "chat_repository.delete_chat_users",
                DELETE_CHAT_USERS,
            ))
            .await
            .map_err(|e| ChatError::storage(format!("delete chat users: {e}")))?;

        let chats = sqlx::query(DELETE_CHAT)
            .bind(chat_id.0)
            .execute(&mut *exec)
            .instrument(statement_span("chat_repository.delete", DELETE_CHAT))
            .await
            .map_err(|e| ChatError::storage(format!("delete chat: {e}")))?;

        debug!(
            %chat_id,
            memberships = memberships.rows_affected(),
            chats = chats.rows_affected(),
            "chat rows deleted"
        );
        Ok(())
    }

    async fn exists(&self, exec: &mut SqliteConnection, chat_id: ChatId) -> Result<(), ChatError> {
        let found: Option<i64> = sqlx::query_scalar(CHAT_EXISTS)
            .bind(chat_id.0)
            .fetch_optional(&mut *exec)
            .instrument(statement_span("chat_repository.chat_exists", CHAT_EXISTS))
            .await
            .map_err(|e| ChatError::storage(format!("check chat: {e}")))?;

        match found {
            Some(_) => Ok(()),
            None => Err(ChatError::chat_not_found(chat_id)),
        }
    }

    async fn is_member(
        &self,
        exec: &mut SqliteConnection,
        user_id: UserId,
        chat_id: ChatId,
    ) -> Result<(), ChatError> {
        let found: Option<i64> = sqlx::query_scalar(IS_MEMBER)
            .bind(chat_id.0)
            .bind(user_id.0)
            .fetch_optional(&mut *exec)
            .instrument(statement_span("chat_repository.is_user_in_chat", IS_MEMBER))
            .await
            .map_err(|e| ChatError::storage(format!("check membership: {e}")))?;

        match found {
            Some(_) => Ok(()),
            None => Err(ChatError::UserNotInChat { user_id, chat_id }),
        }
    }

    async fn send_message(
        &self,
        exec: &mut SqliteConnection,
        message: &NewMessage,
    ) -> Result<(), ChatError> {
        self.exists(exec, message.chat_id).await?;
        self.is_member(exec, message.from_user, message.chat_id)
            .await?;

        let sent_at = format_datetime(&Utc::now());
        sqlx::query(INSERT_MESSAGE)
            .bind(message.chat_id.0)
            .bind(message.from_user.0)
            .bind(&message.text)
            .bind(&sent_at)
            .execute(&mut *exec)
            .instrument(statement_span("chat_repository.send_message", INSERT_MESSAGE))
            .await
            .map_err(|e| ChatError::storage(format!("insert message: {e}")))?;

        debug!(chat_id = %message.chat_id, from_user = %message.from_user, "message inserted");
        Ok(())
    }
}
