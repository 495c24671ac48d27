//! Transaction manager contract.
//!
//! A `TransactionManager` runs a caller-supplied unit of work inside one
//! database transaction. The unit of work receives the transaction's executor
//! explicitly, so repositories stay transaction-agnostic: they run against
//! whatever executor they are handed.
//!
//! Outcome handling shared by every implementation:
//! - `Ok` commits; a failed commit is reported as `ChatError::Storage`.
//! - `Err` rolls back and returns the original error.
//! - A panic rolls back and the panic is resumed.
//! - Cancellation or an elapsed deadline drops the work, rolls back, and
//!   returns `ChatError::Cancelled` / `ChatError::DeadlineExceeded`.
//!
//! Transactions never nest; each service operation opens exactly one.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;

use chatserver_types::error::ChatError;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::context::RequestContext;

/// Future returned by a unit of work borrowing an executor for `'c`.
pub type UnitOfWork<'c, T> = BoxFuture<'c, Result<T, ChatError>>;

/// Runs units of work inside READ COMMITTED (or stronger) transactions.
///
/// `Executor` is the handle repositories execute statements against while the
/// transaction is open (e.g. a SQLite connection).
pub trait TransactionManager: Send + Sync {
    type Executor: Send;

    /// Run `work` in a single READ COMMITTED transaction.
    fn read_committed<T, F>(
        &self,
        ctx: &RequestContext,
        work: F,
    ) -> impl Future<Output = Result<T, ChatError>> + Send
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut Self::Executor) -> UnitOfWork<'c, T> + Send + 'static;
}

/// How a supervised unit of work ended.
pub enum Outcome<T> {
    /// The work ran to completion.
    Finished(Result<T, ChatError>),
    /// The work panicked; the payload must be resumed after rolling back.
    Panicked(Box<dyn Any + Send + 'static>),
    /// Cancellation or the deadline fired first; the work was dropped.
    Interrupted(ChatError),
}

/// Drive `work` to completion while watching `ctx` for cancellation and its
/// deadline. Panics inside `work` are caught and returned as
/// [`Outcome::Panicked`].
pub async fn supervise<T, Fut>(ctx: &RequestContext, work: Fut) -> Outcome<T>
where
    Fut: Future<Output = Result<T, ChatError>> + Send,
{
    let guarded = AssertUnwindSafe(work).catch_unwind();
    let deadline = async {
        match ctx.deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Outcome::Interrupted(ChatError::Cancelled),
        _ = deadline => Outcome::Interrupted(ChatError::DeadlineExceeded),
        result = guarded => match result {
            Ok(result) => Outcome::Finished(result),
            Err(payload) => Outcome::Panicked(payload),
        },
    }
}

/// Transaction manager that invokes the unit of work directly, without a real
/// transaction, handing it a default-constructed executor.
///
/// Used to exercise services against in-memory repositories. Cancellation,
/// deadline, and panic handling match the real implementations.
pub struct NoopTransactionManager<E = ()> {
    _executor: PhantomData<fn() -> E>,
}

impl<E> NoopTransactionManager<E> {
    pub fn new() -> Self {
        Self {
            _executor: PhantomData,
        }
    }
}

impl<E> Default for NoopTransactionManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TransactionManager for NoopTransactionManager<E>
where
    E: Default + Send + 'static,
{
    type Executor = E;

    async fn read_committed<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, ChatError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut E) -> UnitOfWork<'c, T> + Send + 'static,
    {
        if ctx.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let mut executor = E::default();
        match supervise(ctx, work(&mut executor)).await {
            Outcome::Finished(result) => result,
            Outcome::Interrupted(err) => Err(err),
            Outcome::Panicked(payload) => std::panic::resume_unwind(payload),
        }
    }
}
