//! Draw Repository
//!
//! Read access to draws and their multiplier records, plus the lazy
//! creation of the draw's base NUMBER multiplier so future resolutions are
//! a single lookup.

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{BASE_MULTIPLIER_NAME, Draw, DrawMultiplier, MultiplierKind};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct DrawRepository {
    base: BaseRepository,
}

impl DrawRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Draw>> {
        let draw: Option<Draw> = self
            .base
            .db()
            .select(("draw", strip_table_prefix("draw", id)))
            .await?;
        Ok(draw)
    }

    /// The draw's base NUMBER multiplier: the record named "Base", or the
    /// first active NUMBER record when none carries that name.
    pub async fn find_base_multiplier(&self, draw: &str) -> RepoResult<Option<DrawMultiplier>> {
        let draw_owned = draw.to_string();
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM draw_multiplier
                WHERE draw = $draw AND kind = 'NUMBER' AND is_active = true
                ORDER BY name
                "#,
            )
            .bind(("draw", draw_owned))
            .await?;
        let records: Vec<DrawMultiplier> = result.take(0)?;
        Ok(records
            .iter()
            .find(|m| m.name == BASE_MULTIPLIER_NAME)
            .cloned()
            .or_else(|| records.into_iter().next()))
    }

    /// Lazily create the base NUMBER multiplier record for a draw.
    pub async fn create_base_multiplier(
        &self,
        draw: &str,
        value: f64,
    ) -> RepoResult<DrawMultiplier> {
        let record = DrawMultiplier {
            id: None,
            draw: draw.to_string(),
            name: BASE_MULTIPLIER_NAME.to_string(),
            kind: MultiplierKind::Number,
            value,
            is_active: true,
        };
        let created: Option<DrawMultiplier> = self
            .base
            .db()
            .create("draw_multiplier")
            .content(record)
            .await?;
        created.ok_or_else(|| {
            RepoError::Database("Failed to create base multiplier record".to_string())
        })
    }

    /// Whether the draw has an active BOOST multiplier record. The boost
    /// side-bet cannot be sold without one.
    pub async fn has_active_boost(&self, draw: &str) -> RepoResult<bool> {
        let draw_owned = draw.to_string();
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM draw_multiplier
                WHERE draw = $draw AND kind = 'BOOST' AND is_active = true
                LIMIT 1
                "#,
            )
            .bind(("draw", draw_owned))
            .await?;
        let records: Vec<DrawMultiplier> = result.take(0)?;
        Ok(!records.is_empty())
    }
}
