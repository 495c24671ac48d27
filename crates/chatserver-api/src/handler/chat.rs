//! Chat request handler.

use chatserver_core::chat::service::ChatOperations;
use chatserver_core::context::RequestContext;
use chatserver_core::directory::UserDirectory;
use chatserver_types::chat::{ChatId, NewMessage, UserId};
use tracing::{debug, warn};

use super::error::ApiError;

/// Entry point for chat requests.
///
/// Generic over the chat operations and the user directory so tests can
/// substitute fakes for either.
pub struct ChatHandler<S, D> {
    service: S,
    directory: D,
}

impl<S, D> ChatHandler<S, D>
where
    S: ChatOperations,
    D: UserDirectory,
{
    pub fn new(service: S, directory: D) -> Self {
        Self { service, directory }
    }

    /// Create a chat for `user_ids`. An empty list is rejected before any
    /// storage work happens.
    #[tracing::instrument(
        name = "chat_handler.create_chat",
        skip_all,
        fields(request_id = %ctx.request_id)
    )]
    pub async fn create_chat(
        &self,
        ctx: &RequestContext,
        user_ids: Vec<UserId>,
    ) -> Result<ChatId, ApiError> {
        if user_ids.is_empty() {
            return Err(ApiError::invalid_argument("no users provided for the chat"));
        }

        Ok(self.service.create(ctx, user_ids).await?)
    }

    #[tracing::instrument(
        name = "chat_handler.delete_chat",
        skip_all,
        fields(request_id = %ctx.request_id, %chat_id)
    )]
    pub async fn delete_chat(&self, ctx: &RequestContext, chat_id: ChatId) -> Result<(), ApiError> {
        Ok(self.service.delete(ctx, chat_id).await?)
    }

    /// Post `text` from `from_user` into `chat_id`.
    ///
    /// The sender must be known to the user directory; otherwise the request
    /// fails with `InvalidArgument` and the service is never called.
    #[tracing::instrument(
        name = "chat_handler.send_message",
        skip_all,
        fields(request_id = %ctx.request_id, %chat_id, %from_user)
    )]
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        chat_id: ChatId,
        from_user: UserId,
        text: String,
    ) -> Result<(), ApiError> {
        if let Err(e) = self.directory.ensure_users_exist(ctx, &[from_user]).await {
            warn!(error = %e, "sender rejected by user directory");
            return Err(ApiError::invalid_argument(format!(
                "sender {from_user} is not a known user: {e}"
            )));
        }
        debug!("sender verified");

        let message = NewMessage::new(chat_id, from_user, text);
        Ok(self.service.send_message(ctx, message).await?)
    }
}
