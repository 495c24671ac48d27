//! Chat persistence abstractions and orchestration.
//!
//! This module defines the `ChatRepository` trait that the infrastructure
//! layer implements, and the `ChatService` that runs every repository
//! operation inside exactly one transaction.

pub mod repository;
pub mod service;
