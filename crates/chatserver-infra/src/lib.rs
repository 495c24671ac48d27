//! Infrastructure layer for the chat server.
//!
//! Contains implementations of the traits defined in `chatserver-core`:
//! SQLite storage with a transaction manager, plus configuration and
//! data-directory resolution.

pub mod config;
pub mod sqlite;
