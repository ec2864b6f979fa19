//! `sqlx::Error` → `DomainError` translation. Every repository funnels its
//! failures through here so constraint violations are classified in one place.

use domains::DomainError;
use uuid::Uuid;

/// Which store constraint a failed statement tripped, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(Violation::Unique),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Some(Violation::ForeignKey),
        _ => None,
    }
}

/// Logs the raw driver error and wraps it with the operation name.
pub(crate) fn store(op: &'static str, err: sqlx::Error) -> DomainError {
    tracing::error!(op, error = %err, "store operation failed");
    DomainError::store(op, err)
}

/// Closure form of [`store`] for `map_err`.
pub(crate) fn store_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |err| store(op, err)
}

pub(crate) fn parse_uuid(op: &'static str, raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::store(op, format!("malformed id {raw:?}")))
}

pub(crate) fn count(op: &'static str, n: i64) -> Result<u64, DomainError> {
    u64::try_from(n).map_err(|_| DomainError::store(op, format!("negative count {n}")))
}
