//! Shared domain types for the chat server.
//!
//! This crate contains the domain types used across the workspace: chat and
//! user identifiers, chats, memberships, messages, the `ChatError` taxonomy,
//! and server configuration.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
