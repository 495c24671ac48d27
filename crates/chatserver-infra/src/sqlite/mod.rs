//! SQLite storage layer.
//!
//! Repository and transaction-manager implementations backed by SQLite with
//! WAL mode and split read/write connection pools.

pub mod chat;
pub mod pool;
pub mod tx;
