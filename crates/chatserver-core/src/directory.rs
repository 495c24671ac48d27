//! Known-user lookup.
//!
//! User records live outside this workspace. Before a message is accepted the
//! API layer may ask a `UserDirectory` whether the sender is a known user;
//! a failure here short-circuits the request before any transaction opens.

use std::collections::HashSet;
use std::future::Future;

use chatserver_types::chat::UserId;
use chatserver_types::error::ChatError;

use crate::context::RequestContext;

/// Entity name used in [`ChatError::NotFound`] for unknown users.
pub const USER_ENTITY: &str = "user";

/// Source of truth for which users exist.
pub trait UserDirectory: Send + Sync {
    /// Succeeds when every ID in `user_ids` is a known user.
    fn ensure_users_exist(
        &self,
        ctx: &RequestContext,
        user_ids: &[UserId],
    ) -> impl Future<Output = Result<(), ChatError>> + Send;
}

/// Directory backed by a static allowlist from configuration.
///
/// With no allowlist configured every user is accepted.
#[derive(Debug, Clone, Default)]
pub struct UserAllowlist {
    known: Option<HashSet<UserId>>,
}

impl UserAllowlist {
    /// Accept every user.
    pub fn allow_all() -> Self {
        Self { known: None }
    }

    /// Accept only the given users.
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            known: Some(users.into_iter().collect()),
        }
    }

    /// Build from the optional `known_users` configuration field.
    pub fn from_config(known_users: Option<&[UserId]>) -> Self {
        match known_users {
            Some(users) => Self::new(users.iter().copied()),
            None => Self::allow_all(),
        }
    }
}

impl UserDirectory for UserAllowlist {
    async fn ensure_users_exist(
        &self,
        _ctx: &RequestContext,
        user_ids: &[UserId],
    ) -> Result<(), ChatError> {
        let Some(known) = &self.known else {
            return Ok(());
        };

        match user_ids.iter().find(|id| !known.contains(id)) {
            Some(unknown) => Err(ChatError::NotFound {
                entity: USER_ENTITY,
                id: unknown.0,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allow_all_accepts_anyone() {
        let directory = UserAllowlist::allow_all();
        let result = directory
            .ensure_users_exist(&RequestContext::new(), &[UserId(1), UserId(i64::MAX)])
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_allowlist_rejects_first_unknown_user() {
        let directory = UserAllowlist::new([UserId(7), UserId(9)]);
        let result = directory
            .ensure_users_exist(&RequestContext::new(), &[UserId(7), UserId(42), UserId(43)])
            .await;
        assert_eq!(
            result,
            Err(ChatError::NotFound {
                entity: "user",
                id: 42
            })
        );
    }

    #[tokio::test]
    async fn test_from_config_without_users_allows_all() {
        let directory = UserAllowlist::from_config(None);
        assert!(
            directory
                .ensure_users_exist(&RequestContext::new(), &[UserId(3)])
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_from_config_with_users_restricts() {
        let configured = vec![UserId(3)];
        let directory = UserAllowlist::from_config(Some(&configured));
        assert!(
            directory
                .ensure_users_exist(&RequestContext::new(), &[UserId(4)])
                .await
                .is_err()
        );
    }
}
