//! Multiplier resolution
//!
//! Computes the effective payout multiplier for a plain-number play through
//! an explicit five-level override chain, first hit wins:
//!
//! 1. agent-level override for the draw,
//! 2. window-level override for the draw,
//! 3. bank×draw-level setting,
//! 4. the draw's own "Base" multiplier record (created lazily when absent),
//! 5. a multiplier embedded in the draw's rules document,
//! 6. the process-wide configured default.
//!
//! The play always references the draw's base multiplier record as its
//! identifier; the chain only decides the frozen *value*. Boost-variant
//! plays resolve their factor at evaluation time and only need an active
//! BOOST record to exist at sale time (checked by the orchestrator).

use crate::db::models::{Draw, MultiplierSource};
use crate::db::repository::{DrawRepository, MultiplierOverrideRepository, RepoResult};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

/// Outcome of the chain: the record identifier the play is sold under, the
/// frozen value and which level produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMultiplier {
    pub record: Option<String>,
    pub value: f64,
    pub source: MultiplierSource,
}

#[derive(Clone)]
pub struct MultiplierResolver {
    overrides: MultiplierOverrideRepository,
    draws: DrawRepository,
    default_value: f64,
}

impl MultiplierResolver {
    pub fn new(db: Surreal<Db>, default_value: f64) -> Self {
        Self {
            overrides: MultiplierOverrideRepository::new(db.clone()),
            draws: DrawRepository::new(db),
            default_value,
        }
    }

    /// Resolve the effective multiplier for a plain-number play.
    pub async fn resolve(
        &self,
        agent: &str,
        window: &str,
        bank: &str,
        draw: &Draw,
    ) -> RepoResult<ResolvedMultiplier> {
        let draw_id = draw
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();

        // All levels are fetched up front; the chain itself stays a plain
        // ordered pick so the precedence is visible in one place.
        let (agent_ov, window_ov, bank_setting, base) = tokio::join!(
            self.overrides.agent_override(agent, &draw_id),
            self.overrides.window_override(window, &draw_id),
            self.overrides.bank_draw(bank, &draw_id),
            self.draws.find_base_multiplier(&draw_id),
        );
        let (agent_ov, window_ov, bank_setting, base) =
            (agent_ov?, window_ov?, bank_setting?, base?);

        // Step 4 record: ensure it exists so future lookups are one read.
        let (record, base_value, base_source) = match base {
            Some(m) => (
                m.id.as_ref().map(|id| id.to_string()),
                m.value,
                MultiplierSource::DrawBase,
            ),
            None => {
                let (seed, source) = match draw.rules.as_ref().and_then(|r| r.multiplier) {
                    Some(v) => (v, MultiplierSource::DrawRules),
                    None => (self.default_value, MultiplierSource::Default),
                };
                let created = self.draws.create_base_multiplier(&draw_id, seed).await?;
                debug!(draw = %draw_id, value = seed, "created base multiplier record lazily");
                (created.id.as_ref().map(|id| id.to_string()), seed, source)
            }
        };

        let (value, source) = if let Some(o) = agent_ov {
            (o.value, MultiplierSource::AgentOverride)
        } else if let Some(o) = window_ov {
            (o.value, MultiplierSource::WindowOverride)
        } else if let Some(s) = bank_setting {
            (s.value, MultiplierSource::BankDraw)
        } else {
            (base_value, base_source)
        };

        Ok(ResolvedMultiplier {
            record,
            value,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{DrawRules, DrawStatus};

    fn draw(rules_multiplier: Option<f64>) -> Draw {
        Draw {
            id: Some("draw:d1".parse().unwrap()),
            name: "Evening".to_string(),
            product: "product:p1".to_string(),
            status: DrawStatus::Open,
            close_at: "2026-01-01T20:00:00Z".to_string(),
            rules: rules_multiplier.map(|m| DrawRules {
                multiplier: Some(m),
            }),
        }
    }

    async fn seed(db: &DbService, table: &str, content: serde_json::Value) {
        db.db()
            .query(format!("CREATE {table} CONTENT $content"))
            .bind(("content", content))
            .await
            .unwrap()
            .check()
            .unwrap();
    }

    #[tokio::test]
    async fn test_default_when_nothing_configured() {
        let db = DbService::memory().await.unwrap();
        let resolver = MultiplierResolver::new(db.db(), 70.0);

        let resolved = resolver
            .resolve("agent:a1", "window:w1", "bank:b1", &draw(None))
            .await
            .unwrap();
        assert_eq!(resolved.value, 70.0);
        assert_eq!(resolved.source, MultiplierSource::Default);
        // Lazily created; the next resolution hits the record directly.
        assert!(resolved.record.is_some());

        let again = resolver
            .resolve("agent:a1", "window:w1", "bank:b1", &draw(None))
            .await
            .unwrap();
        assert_eq!(again.value, 70.0);
        assert_eq!(again.source, MultiplierSource::DrawBase);
    }

    #[tokio::test]
    async fn test_draw_rules_seed_base_record() {
        let db = DbService::memory().await.unwrap();
        let resolver = MultiplierResolver::new(db.db(), 70.0);

        let resolved = resolver
            .resolve("agent:a1", "window:w1", "bank:b1", &draw(Some(80.0)))
            .await
            .unwrap();
        assert_eq!(resolved.value, 80.0);
        assert_eq!(resolved.source, MultiplierSource::DrawRules);
    }

    #[tokio::test]
    async fn test_chain_precedence() {
        let db = DbService::memory().await.unwrap();
        let resolver = MultiplierResolver::new(db.db(), 70.0);

        seed(
            &db,
            "draw_multiplier",
            serde_json::json!({
                "draw": "draw:d1", "name": "Base", "kind": "NUMBER",
                "value": 75.0, "is_active": true
            }),
        )
        .await;
        seed(
            &db,
            "bank_draw_multiplier",
            serde_json::json!({ "bank": "bank:b1", "draw": "draw:d1", "value": 78.0 }),
        )
        .await;
        seed(
            &db,
            "window_multiplier",
            serde_json::json!({ "owner": "window:w1", "draw": "draw:d1", "value": 82.0 }),
        )
        .await;
        seed(
            &db,
            "agent_multiplier",
            serde_json::json!({ "owner": "agent:a1", "draw": "draw:d1", "value": 90.0 }),
        )
        .await;

        // Agent override wins over everything
        let resolved = resolver
            .resolve("agent:a1", "window:w1", "bank:b1", &draw(None))
            .await
            .unwrap();
        assert_eq!(resolved.value, 90.0);
        assert_eq!(resolved.source, MultiplierSource::AgentOverride);

        // No agent override: window wins
        let resolved = resolver
            .resolve("agent:a2", "window:w1", "bank:b1", &draw(None))
            .await
            .unwrap();
        assert_eq!(resolved.value, 82.0);
        assert_eq!(resolved.source, MultiplierSource::WindowOverride);

        // Neither agent nor window: bank×draw setting
        let resolved = resolver
            .resolve("agent:a2", "window:w2", "bank:b1", &draw(None))
            .await
            .unwrap();
        assert_eq!(resolved.value, 78.0);
        assert_eq!(resolved.source, MultiplierSource::BankDraw);

        // Nothing above the draw: its own base record
        let resolved = resolver
            .resolve("agent:a2", "window:w2", "bank:b2", &draw(None))
            .await
            .unwrap();
        assert_eq!(resolved.value, 75.0);
        assert_eq!(resolved.source, MultiplierSource::DrawBase);
        assert!(resolved.record.is_some());
    }
}
