//! Entity Repository
//!
//! Point lookups for the tenant hierarchy (bank, window, agent, product).
//! The sale path only ever needs active/enabled checks and the hierarchy
//! refs, so this repository stays read-only.

use super::{BaseRepository, RepoResult, strip_table_prefix};
use crate::db::models::{Agent, Bank, Product, Window};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct EntityRepository {
    base: BaseRepository,
}

impl EntityRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_bank(&self, id: &str) -> RepoResult<Option<Bank>> {
        let bank: Option<Bank> = self
            .base
            .db()
            .select(("bank", strip_table_prefix("bank", id)))
            .await?;
        Ok(bank)
    }

    pub async fn find_window(&self, id: &str) -> RepoResult<Option<Window>> {
        let window: Option<Window> = self
            .base
            .db()
            .select(("window", strip_table_prefix("window", id)))
            .await?;
        Ok(window)
    }

    pub async fn find_agent(&self, id: &str) -> RepoResult<Option<Agent>> {
        let agent: Option<Agent> = self
            .base
            .db()
            .select(("agent", strip_table_prefix("agent", id)))
            .await?;
        Ok(agent)
    }

    pub async fn find_product(&self, id: &str) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self
            .base
            .db()
            .select(("product", strip_table_prefix("product", id)))
            .await?;
        Ok(product)
    }
}
