//! Sequence allocator
//!
//! Issues strictly increasing ticket numbers from a single shared counter
//! row. The counter is the sole point of serialization for numbering: the
//! atomic upsert-and-read is performed as the **first write** of the sale
//! transaction so that lock contention is resolved early, and the increment
//! rolls back together with a failed attempt. No application-level mutex is
//! involved; the database's own row locking plus the retry wrapper resolve
//! collisions.

use crate::db::repository::{BaseRepository, RepoError, RepoResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// The single counter row holding the last-issued ticket number.
pub const COUNTER_RECORD: &str = "ticket_counter:serial";

/// Counter increment statement, shared with the sale transaction so both
/// paths contend on the same row with identical semantics. Leaves the new
/// value in `$seq`.
pub(crate) const ALLOCATE_STMT: &str =
    "LET $seq = (UPSERT ticket_counter:serial SET value = (value ?? 0) + 1 RETURN AFTER)[0].value;";

#[derive(Debug, Deserialize)]
struct CounterRow {
    value: i64,
}

/// Allocator handle over the shared counter row.
#[derive(Clone)]
pub struct SequenceAllocator {
    base: BaseRepository,
}

impl SequenceAllocator {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Atomically increment the counter and return the new value.
    pub async fn next(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "UPSERT {COUNTER_RECORD} SET value = (value ?? 0) + 1 RETURN AFTER"
            ))
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.value)
            .ok_or_else(|| RepoError::Database("Counter upsert returned no row".to_string()))
    }

    /// Last issued value (0 when nothing was ever sold).
    pub async fn current(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(format!("SELECT `value` FROM {COUNTER_RECORD}"))
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.value).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_next_is_monotonic() {
        let db = DbService::memory().await.unwrap();
        let allocator = SequenceAllocator::new(db.db());

        assert_eq!(allocator.current().await.unwrap(), 0);
        assert_eq!(allocator.next().await.unwrap(), 1);
        assert_eq!(allocator.next().await.unwrap(), 2);
        assert_eq!(allocator.next().await.unwrap(), 3);
        assert_eq!(allocator.current().await.unwrap(), 3);
    }
}
