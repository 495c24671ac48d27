//! SQLite implementation of `TransactionManager`.
//!
//! Every unit of work runs on the single writer connection inside one
//! `BEGIN`/`COMMIT` pair. SQLite in WAL mode with a single writer gives
//! serializable isolation, which satisfies the READ COMMITTED contract.

use chatserver_core::context::RequestContext;
use chatserver_core::tx::{Outcome, TransactionManager, UnitOfWork, supervise};
use chatserver_observe::db_attrs::transaction_span;
use chatserver_types::error::ChatError;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{Instrument, debug, warn};

use super::pool::DatabasePool;

/// Transaction manager running units of work on the writer pool.
#[derive(Clone)]
pub struct SqliteTransactionManager {
    pool: DatabasePool,
}

impl SqliteTransactionManager {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    async fn begin(&self, ctx: &RequestContext) -> Result<Transaction<'static, Sqlite>, ChatError> {
        let begin = async {
            self.pool
                .writer
                .begin()
                .await
                .map_err(|e| ChatError::storage(format!("begin transaction: {e}")))
        };

        // Waiting for the writer connection honors cancellation and the deadline too
        match supervise(ctx, begin).await {
            Outcome::Finished(result) => result,
            Outcome::Interrupted(err) => Err(err),
            Outcome::Panicked(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Roll back, logging (not returning) a rollback failure so the original
/// outcome reaches the caller.
async fn rollback(tx: Transaction<'static, Sqlite>, reason: &'static str) {
    match tx.rollback().await {
        Ok(()) => debug!(reason, "transaction rolled back"),
        Err(e) => warn!(reason, error = %e, "rollback failed"),
    }
}

impl TransactionManager for SqliteTransactionManager {
    type Executor = SqliteConnection;

    async fn read_committed<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, ChatError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, T> + Send + 'static,
    {
        let span = transaction_span();

        async move {
            if ctx.is_cancelled() {
                return Err(ChatError::Cancelled);
            }

            let mut tx = self.begin(ctx).await?;
            let outcome = supervise(ctx, work(&mut *tx)).await;

            match outcome {
                Outcome::Finished(Ok(value)) => {
                    if ctx.is_cancelled() {
                        rollback(tx, "cancelled").await;
                        tracing::Span::current().record("outcome", "cancelled");
                        return Err(ChatError::Cancelled);
                    }
                    // Not supervised: an interrupted COMMIT would leave its result unknown
                    if let Err(e) = tx.commit().await {
                        warn!(error = %e, "commit failed");
                        tracing::Span::current().record("outcome", "commit_failed");
                        return Err(ChatError::storage(format!("commit transaction: {e}")));
                    }
                    tracing::Span::current().record("outcome", "committed");
                    Ok(value)
                }
                Outcome::Finished(Err(err)) => {
                    rollback(tx, "error").await;
                    tracing::Span::current().record("outcome", "rolled_back");
                    Err(err)
                }
                Outcome::Interrupted(err) => {
                    rollback(tx, "interrupted").await;
                    tracing::Span::current().record("outcome", "interrupted");
                    Err(err)
                }
                Outcome::Panicked(payload) => {
                    rollback(tx, "panic").await;
                    tracing::Span::current().record("outcome", "panicked");
                    std::panic::resume_unwind(payload)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn test_manager() -> SqliteTransactionManager {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        // Keep tempdir alive by leaking it (test only)
        std::mem::forget(dir);
        SqliteTransactionManager::new(pool)
    }

    fn insert_chat(exec: &mut SqliteConnection) -> UnitOfWork<'_, i64> {
        Box::pin(async move {
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO chats (created_at) VALUES ('2025-01-01T00:00:00Z') RETURNING id",
            )
            .fetch_one(&mut *exec)
            .await
            .map_err(ChatError::storage)
        })
    }

    fn explode() -> Result<(), ChatError> {
        panic!("work exploded")
    }

    async fn chat_count(manager: &SqliteTransactionManager) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&manager.pool().reader)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let manager = test_manager().await;

        let id = manager
            .read_committed(&RequestContext::new(), insert_chat)
            .await
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(chat_count(&manager).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_error_returns_original_error() {
        let manager = test_manager().await;

        let result = manager
            .read_committed(&RequestContext::new(), |exec| {
                Box::pin(async move {
                    insert_chat(exec).await?;
                    Err::<(), _>(ChatError::Validation("second statement failed".to_string()))
                })
            })
            .await;

        assert_eq!(
            result,
            Err(ChatError::Validation("second statement failed".to_string()))
        );
        assert_eq!(chat_count(&manager).await, 0);
    }

    #[tokio::test]
    async fn test_rollback_on_panic_then_panic_resumes() {
        let manager = test_manager().await;
        let task_manager = manager.clone();

        let handle = tokio::spawn(async move {
            task_manager
                .read_committed(&RequestContext::new(), |exec| {
                    Box::pin(async move {
                        insert_chat(exec).await?;
                        explode()
                    })
                })
                .await
        });

        let join = handle.await;
        assert!(join.is_err_and(|e| e.is_panic()));
        assert_eq!(chat_count(&manager).await, 0);

        // The writer connection is usable again afterwards
        manager
            .read_committed(&RequestContext::new(), insert_chat)
            .await
            .unwrap();
        assert_eq!(chat_count(&manager).await, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_is_storage_error() {
        let manager = test_manager().await;

        // Deferred foreign keys are only checked at COMMIT
        let result = manager
            .read_committed(&RequestContext::new(), |exec| {
                Box::pin(async move {
                    sqlx::query("PRAGMA defer_foreign_keys = ON")
                        .execute(&mut *exec)
                        .await
                        .map_err(ChatError::storage)?;
                    sqlx::query("INSERT INTO chat_users (chat_id, user_id) VALUES (999, 1)")
                        .execute(&mut *exec)
                        .await
                        .map_err(ChatError::storage)?;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(result, Err(ChatError::Storage(ref msg)) if msg.starts_with("commit transaction")));
        let memberships: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_users")
            .fetch_one(&manager.pool().reader)
            .await
            .unwrap();
        assert_eq!(memberships, 0);

        let id = manager
            .read_committed(&RequestContext::new(), insert_chat)
            .await
            .unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_cancellation() {
        let manager = test_manager().await;
        let ctx = RequestContext::new();
        let token = ctx.cancellation.clone();

        let result = manager
            .read_committed(&ctx, move |exec| {
                Box::pin(async move {
                    insert_chat(exec).await?;
                    token.cancel();
                    std::future::pending::<()>().await;
                    Ok(())
                })
            })
            .await;

        assert_eq!(result, Err(ChatError::Cancelled));
        assert_eq!(chat_count(&manager).await, 0);
    }

    #[tokio::test]
    async fn test_cancel_after_work_finishes_still_rolls_back() {
        let manager = test_manager().await;
        let ctx = RequestContext::new();
        let token = ctx.cancellation.clone();

        let result = manager
            .read_committed(&ctx, move |exec| {
                Box::pin(async move {
                    let id = insert_chat(exec).await?;
                    token.cancel();
                    Ok(id)
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(chat_count(&manager).await, 0);
    }

    #[tokio::test]
    async fn test_deadline_rolls_back() {
        let manager = test_manager().await;
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));

        let result = manager
            .read_committed(&ctx, |exec| {
                Box::pin(async move {
                    insert_chat(exec).await?;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                })
            })
            .await;

        assert_eq!(result, Err(ChatError::DeadlineExceeded));
        assert_eq!(chat_count(&manager).await, 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_context_opens_no_transaction() {
        let manager = test_manager().await;
        let ctx = RequestContext::new();
        ctx.cancel();

        let result = manager.read_committed(&ctx, insert_chat).await;

        assert_eq!(result, Err(ChatError::Cancelled));
        assert_eq!(chat_count(&manager).await, 0);
    }
}
