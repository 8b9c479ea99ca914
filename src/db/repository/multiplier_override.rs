//! Multiplier Override Repository
//!
//! Read-only lookups for the three override levels above the draw's own
//! multiplier records: agent, window and bank×draw.

use super::{BaseRepository, RepoResult};
use crate::db::models::{AgentMultiplierOverride, BankDrawMultiplier, WindowMultiplierOverride};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct MultiplierOverrideRepository {
    base: BaseRepository,
}

impl MultiplierOverrideRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn agent_override(
        &self,
        owner: &str,
        draw: &str,
    ) -> RepoResult<Option<AgentMultiplierOverride>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM agent_multiplier WHERE owner = $owner AND draw = $draw LIMIT 1")
            .bind(("owner", owner.to_string()))
            .bind(("draw", draw.to_string()))
            .await?;
        let records: Vec<AgentMultiplierOverride> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    pub async fn window_override(
        &self,
        owner: &str,
        draw: &str,
    ) -> RepoResult<Option<WindowMultiplierOverride>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM window_multiplier WHERE owner = $owner AND draw = $draw LIMIT 1")
            .bind(("owner", owner.to_string()))
            .bind(("draw", draw.to_string()))
            .await?;
        let records: Vec<WindowMultiplierOverride> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    pub async fn bank_draw(
        &self,
        bank: &str,
        draw: &str,
    ) -> RepoResult<Option<BankDrawMultiplier>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM bank_draw_multiplier WHERE bank = $bank AND draw = $draw LIMIT 1")
            .bind(("bank", bank.to_string()))
            .bind(("draw", draw.to_string()))
            .await?;
        let records: Vec<BankDrawMultiplier> = result.take(0)?;
        Ok(records.into_iter().next())
    }
}
