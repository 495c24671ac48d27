//! Database span helpers following the OpenTelemetry semantic conventions.
//!
//! Field names match the OTel database attribute keys so that spans bridged
//! through `tracing-opentelemetry` arrive with the expected names.

use tracing::Span;

// ---------------------------------------------------------------------------
// Well-known values
// ---------------------------------------------------------------------------

pub const DB_SYSTEM_SQLITE: &str = "sqlite";
pub const ISOLATION_READ_COMMITTED: &str = "read_committed";

/// Open a debug-level span for one statement.
///
/// `operation` is a stable statement name such as `chat_repository.create`;
/// `sql` is recorded verbatim (statements are parameterized, so no values leak).
pub fn statement_span(operation: &'static str, sql: &'static str) -> Span {
    tracing::debug_span!(
        "db.query",
        db.system.name = DB_SYSTEM_SQLITE,
        db.operation.name = operation,
        db.query.text = sql,
    )
}

/// Open a span covering a whole transaction.
pub fn transaction_span() -> Span {
    tracing::debug_span!(
        "db.transaction",
        db.system.name = DB_SYSTEM_SQLITE,
        db.transaction.isolation_level = ISOLATION_READ_COMMITTED,
        outcome = tracing::field::Empty,
    )
}
