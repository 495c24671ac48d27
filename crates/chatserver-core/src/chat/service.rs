//! Chat service running repository operations under transactions.
//!
//! Each public operation opens exactly one READ COMMITTED unit of work and
//! delegates to the matching `ChatRepository` call, so multi-statement
//! repository operations are atomic even though the repository itself is
//! transaction-agnostic. Errors are propagated unchanged.

use std::future::Future;
use std::sync::Arc;

use chatserver_types::chat::{ChatId, NewMessage, UserId};
use chatserver_types::error::ChatError;
use tracing::info;

use crate::chat::repository::ChatRepository;
use crate::context::RequestContext;
use crate::tx::TransactionManager;

/// The three chat operations offered to the API layer.
///
/// Implemented by [`ChatService`]; API-layer tests substitute their own.
pub trait ChatOperations: Send + Sync {
    /// Create a chat with the given members and return its ID.
    fn create(
        &self,
        ctx: &RequestContext,
        user_ids: Vec<UserId>,
    ) -> impl Future<Output = Result<ChatId, ChatError>> + Send;

    /// Delete a chat together with its memberships and messages.
    fn delete(
        &self,
        ctx: &RequestContext,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Append a message to a chat the sender belongs to.
    fn send_message(
        &self,
        ctx: &RequestContext,
        message: NewMessage,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;
}

/// Orchestrates chat persistence inside transaction-scoped units of work.
///
/// Generic over `ChatRepository` and `TransactionManager` to maintain clean
/// architecture (chatserver-core never depends on chatserver-infra). The two
/// must agree on the executor type.
pub struct ChatService<R, M> {
    repo: Arc<R>,
    tx_manager: M,
}

impl<R, M> ChatService<R, M>
where
    R: ChatRepository + 'static,
    M: TransactionManager<Executor = R::Executor>,
{
    /// Create a new chat service with the given repository and transaction manager.
    pub fn new(repo: R, tx_manager: M) -> Self {
        Self {
            repo: Arc::new(repo),
            tx_manager,
        }
    }

    /// Access the chat repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<R, M> ChatOperations for ChatService<R, M>
where
    R: ChatRepository + 'static,
    M: TransactionManager<Executor = R::Executor>,
{
    #[tracing::instrument(
        name = "chat_service.create",
        skip_all,
        fields(request_id = %ctx.request_id, users = user_ids.len())
    )]
    async fn create(&self, ctx: &RequestContext, user_ids: Vec<UserId>) -> Result<ChatId, ChatError> {
        let repo = Arc::clone(&self.repo);
        let chat_id = self
            .tx_manager
            .read_committed(ctx, move |exec| {
                Box::pin(async move { repo.create(exec, &user_ids).await })
            })
            .await?;

        info!(%chat_id, "chat created");
        Ok(chat_id)
    }

    #[tracing::instrument(
        name = "chat_service.delete",
        skip_all,
        fields(request_id = %ctx.request_id, %chat_id)
    )]
    async fn delete(&self, ctx: &RequestContext, chat_id: ChatId) -> Result<(), ChatError> {
        let repo = Arc::clone(&self.repo);
        self.tx_manager
            .read_committed(ctx, move |exec| {
                Box::pin(async move { repo.delete(exec, chat_id).await })
            })
            .await?;

        info!("chat deleted");
        Ok(())
    }

    #[tracing::instrument(
        name = "chat_service.send_message",
        skip_all,
        fields(request_id = %ctx.request_id, chat_id = %message.chat_id, from_user = %message.from_user)
    )]
    async fn send_message(&self, ctx: &RequestContext, message: NewMessage) -> Result<(), ChatError> {
        let repo = Arc::clone(&self.repo);
        self.tx_manager
            .read_committed(ctx, move |exec| {
                Box::pin(async move { repo.send_message(exec, &message).await })
            })
            .await?;

        info!("message sent");
        Ok(())
    }
}
