//! Restriction Rule Repository
//!
//! Fetches every active rule applicable to a (bank, window, agent) triple.
//! A rule at any of the three scopes is applicable; finer matching against
//! numbers, play kinds, multipliers, dates and hours is pure logic in
//! `restriction::matcher`.

use super::{BaseRepository, RepoResult};
use crate::db::models::RestrictionRule;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct RestrictionRuleRepository {
    base: BaseRepository,
}

impl RestrictionRuleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All active rules scoped to the agent, its window or its bank.
    pub async fn find_applicable(
        &self,
        bank: &str,
        window: &str,
        agent: &str,
    ) -> RepoResult<Vec<RestrictionRule>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM restriction_rule
                WHERE is_active = true
                  AND (agent = $agent OR window = $window OR bank = $bank)
                "#,
            )
            .bind(("agent", agent.to_string()))
            .bind(("window", window.to_string()))
            .bind(("bank", bank.to_string()))
            .await?;
        let rules: Vec<RestrictionRule> = result.take(0)?;
        Ok(rules)
    }
}
