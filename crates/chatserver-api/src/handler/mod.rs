//! Request handlers.
//!
//! Handlers validate caller input, consult the user directory where needed,
//! and translate `ChatError` into the caller-facing [`error::ApiError`].

pub mod chat;
pub mod error;
