//! Application state wiring the chat handler to its concrete dependencies.
//!
//! `ChatService` and `ChatHandler` are generic over their collaborators;
//! AppState pins them to the SQLite implementations and the config-driven
//! user allowlist.

use std::path::PathBuf;
use std::sync::Arc;

use chatserver_core::chat::service::ChatService;
use chatserver_core::context::RequestContext;
use chatserver_core::directory::UserAllowlist;
use chatserver_infra::sqlite::chat::SqliteChatRepository;
use chatserver_infra::sqlite::pool::DatabasePool;
use chatserver_infra::sqlite::tx::SqliteTransactionManager;
use chatserver_types::config::ServerConfig;
use tokio_util::sync::CancellationToken;

use crate::handler::chat::ChatHandler;

/// Concrete type aliases for the generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, SqliteTransactionManager>;

pub type ConcreteChatHandler = ChatHandler<ConcreteChatService, UserAllowlist>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_handler: Arc<ConcreteChatHandler>,
    pub config: Arc<ServerConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    /// Cancelled on Ctrl+C; every request context derives from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Connect to the database and wire the handler.
    pub async fn init(
        data_dir: PathBuf,
        config: ServerConfig,
        database_url: &str,
    ) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(database_url).await?;

        let chat_service = ChatService::new(
            SqliteChatRepository::new(),
            SqliteTransactionManager::new(db_pool.clone()),
        );
        let directory = UserAllowlist::from_config(config.known_users.as_deref());
        let chat_handler = ChatHandler::new(chat_service, directory);

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            chat_handler: Arc::new(chat_handler),
            config: Arc::new(config),
            data_dir,
            db_pool,
            shutdown: CancellationToken::new(),
        })
    }

    /// Fresh context for one request: shutdown-aware, with the configured deadline.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new()
            .with_parent_cancellation(&self.shutdown)
            .with_optional_timeout(self.config.request_timeout())
    }
}
