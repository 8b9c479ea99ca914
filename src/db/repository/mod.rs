//! Repository Module
//!
//! CRUD and query access to SurrealDB tables, one repository per aggregate.

pub mod commission_policy;
pub mod draw;
pub mod entity;
pub mod multiplier_override;
pub mod restriction_rule;
pub mod ticket;

pub use commission_policy::CommissionPolicyRepository;
pub use draw::DrawRepository;
pub use entity::EntityRepository;
pub use multiplier_override::MultiplierOverrideRepository;
pub use restriction_rule::RestrictionRuleRepository;
pub use ticket::{CapGuard, PlayContent, TicketAggregate, TicketDraft, TicketRepository};

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Strip a `"table:"` prefix from an id, leaving bare keys untouched.
///
/// Ids travel through the engine as `"table:key"` strings; point lookups
/// need the bare key.
pub(crate) fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    match id.split_once(':') {
        Some((t, key)) if t == table => key,
        _ => id,
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
