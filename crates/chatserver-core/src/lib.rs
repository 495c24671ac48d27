//! Business logic and repository trait definitions for the chat server.
//!
//! This crate defines the "ports" (repository, transaction manager, and user
//! directory traits) that the infrastructure layer implements. It depends
//! only on `chatserver-types` -- never on `chatserver-infra` or any
//! database/IO crate.

pub mod chat;
pub mod context;
pub mod directory;
pub mod tx;
