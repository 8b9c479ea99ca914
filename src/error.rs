//! Engine error taxonomy
//!
//! Three families, with distinct caller-visible behaviour:
//! - validation errors and restriction rejections are surfaced immediately
//!   with precise context and are never retried,
//! - transient infrastructure errors (conflicts, timeouts, busy engine) are
//!   retried and only surface once the retry budget is exhausted,
//! - everything else propagates as an internal failure, logged with context
//!   before propagation.

use crate::db::repository::RepoError;
use crate::restriction::Violation;
use crate::retry::ErrorFamily;

/// Errors produced by the ticket sale transaction engine.
#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    // ========== Validation (non-retryable) ==========
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Inactive entity: {0}")]
    Inactive(String),

    #[error("Entity mismatch: {0}")]
    Mismatch(String),

    #[error("Draw not open for sale: {0}")]
    DrawNotOpen(String),

    #[error("Sales cutoff passed for draw {draw}: closes at {close_at}, cutoff {minutes} min")]
    CutoffPassed {
        draw: String,
        close_at: String,
        minutes: u32,
    },

    #[error("Invalid play: {0}")]
    InvalidPlay(String),

    // ========== Restriction rejections (non-retryable) ==========
    #[error("{}", .0.message)]
    Restricted(Box<Violation>),

    #[error("Multiplier {multiplier} is blocked by a bank rule")]
    MultiplierBlocked { multiplier: String },

    // ========== Transient infrastructure (retryable) ==========
    #[error("Engine busy: {0}")]
    Busy(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Could not complete the sale after {attempts} attempts, try again")]
    RetriesExhausted { attempts: u32, last: String },

    // ========== Unexpected ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SaleError {
    /// Retry classification. `None` means the error must not be retried.
    pub fn family(&self) -> Option<ErrorFamily> {
        match self {
            SaleError::Busy(_) | SaleError::Timeout(_) => Some(ErrorFamily::Connection),
            SaleError::Database(msg) => classify_database(msg),
            _ => None,
        }
    }
}

/// Classify a raw database error message into a retry family.
///
/// The embedded engine reports conflicts, pool exhaustion and uniqueness
/// violations as strings; markers below cover the messages observed from
/// SurrealDB's local engines.
fn classify_database(msg: &str) -> Option<ErrorFamily> {
    let lower = msg.to_lowercase();

    const CONNECTION_MARKERS: &[&str] = &[
        "timed out",
        "timeout",
        "connection",
        "pool",
        "unreachable",
        "resource busy",
    ];
    const CONFLICT_MARKERS: &[&str] = &[
        "conflict",
        "can be retried",
        "failed transaction",
        "transaction was already",
        "deadlock",
        "already contains",
        "already exists",
    ];

    if CONNECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(ErrorFamily::Connection);
    }
    if CONFLICT_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(ErrorFamily::Conflict);
    }
    None
}

impl From<RepoError> for SaleError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => SaleError::NotFound(msg),
            // Duplicates at the storage level are sequence/unique-index
            // collisions: retryable, a fresh attempt re-reads the counter.
            RepoError::Duplicate(msg) => SaleError::Database(format!("already exists: {msg}")),
            RepoError::Database(msg) => SaleError::Database(msg),
            RepoError::Validation(msg) => SaleError::InvalidPlay(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let err = SaleError::Database("The transaction can be retried".to_string());
        assert_eq!(err.family(), Some(ErrorFamily::Conflict));

        let err = SaleError::Database(
            "Database index `ticket_sequence` already contains 42".to_string(),
        );
        assert_eq!(err.family(), Some(ErrorFamily::Conflict));

        let err = SaleError::Database("write conflict on key".to_string());
        assert_eq!(err.family(), Some(ErrorFamily::Conflict));
    }

    #[test]
    fn test_connection_classification() {
        let err = SaleError::Database("connection pool exhausted".to_string());
        assert_eq!(err.family(), Some(ErrorFamily::Connection));

        assert_eq!(
            SaleError::Busy("no slot".into()).family(),
            Some(ErrorFamily::Connection)
        );
        assert_eq!(
            SaleError::Timeout("attempt".into()).family(),
            Some(ErrorFamily::Connection)
        );
    }

    #[test]
    fn test_domain_errors_not_retryable() {
        assert_eq!(SaleError::NotFound("draw".into()).family(), None);
        assert_eq!(SaleError::InvalidPlay("bad".into()).family(), None);
        assert_eq!(SaleError::DrawNotOpen("draw:x".into()).family(), None);
        assert_eq!(
            SaleError::Database("schema does not allow this".into()).family(),
            None
        );
    }
}
