//! Server configuration types.
//!
//! `ServerConfig` represents the `config.toml` in the data directory that
//! controls the database location, request deadlines, the known-user
//! allowlist, and logging.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::UserId;

/// Top-level configuration for `chatd`.
///
/// Loaded from `~/.chatd/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SQLite connection URL. Defaults to `{data_dir}/chat.db` when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Deadline applied to each request's unit of work, in seconds.
    /// Zero disables the deadline.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Users accepted as message senders. When unset every user is accepted.
    #[serde(default)]
    pub known_users: Option<Vec<UserId>>,

    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    /// The per-request deadline, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            known_users: None,
            log_filter: None,
        }
    }
}
