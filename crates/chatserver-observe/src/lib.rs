//! Observability setup for the chat server.
//!
//! - [`tracing_setup`]: subscriber initialization with optional OpenTelemetry export.
//! - [`db_attrs`]: database span naming and attribute conventions.

pub mod db_attrs;
pub mod tracing_setup;
