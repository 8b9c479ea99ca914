//! Commission Policy Repository
//!
//! Read access to the raw JSON policy documents attached to banks, windows
//! and agents. Validation happens in `commission::policy`, not here.

use super::{BaseRepository, RepoResult};
use crate::db::models::CommissionPolicyRecord;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct CommissionPolicyRepository {
    base: BaseRepository,
}

impl CommissionPolicyRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// The raw policy document for an owner, if one exists.
    pub async fn find_by_owner(&self, owner: &str) -> RepoResult<Option<CommissionPolicyRecord>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM commission_policy WHERE owner = $owner LIMIT 1")
            .bind(("owner", owner.to_string()))
            .await?;
        let records: Vec<CommissionPolicyRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }
}
