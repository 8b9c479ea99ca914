//! Commission resolver
//!
//! Selects the owning policy for a sale (agent, then window, then bank) and
//! freezes a per-play snapshot. Policy documents are cached briefly per
//! owner; sales tolerate staleness bounded by the TTL.

use super::policy::CommissionPolicy;
use crate::cache::TtlCache;
use crate::db::models::{CommissionSource, PlayKind};
use crate::db::repository::{CommissionPolicyRepository, RepoResult};
use crate::money;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::warn;

/// Frozen commission values for one play.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionSnapshot {
    pub percent: f64,
    pub amount: f64,
    pub source: CommissionSource,
    pub rule: Option<String>,
}

/// Outcome of policy ownership selection for one sale.
#[derive(Debug, Clone)]
pub struct PolicySelection {
    pub source: CommissionSource,
    /// None when no owner has a document, or the owning document degraded
    policy: Option<Arc<CommissionPolicy>>,
}

/// Per-owner cached policy state. "Has a document but it is unusable" must
/// be remembered distinctly from "has no document": a broken agent policy
/// still shadows the window's and bank's.
#[derive(Debug)]
enum CachedPolicy {
    Missing,
    Degraded,
    Valid(Arc<CommissionPolicy>),
}

pub struct CommissionResolver {
    policies: CommissionPolicyRepository,
    cache: TtlCache<CachedPolicy>,
}

impl CommissionResolver {
    pub fn new(db: Surreal<Db>, cache_ttl: Duration) -> Self {
        Self {
            policies: CommissionPolicyRepository::new(db),
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Pick the policy that owns commission for this sale: the first level
    /// (agent, window, bank) holding a document wins outright. A level with
    /// a malformed document still wins, degraded to fallback.
    pub async fn select_policy(
        &self,
        agent: &str,
        window: &str,
        bank: &str,
        today: NaiveDate,
    ) -> RepoResult<PolicySelection> {
        let (agent_policy, window_policy, bank_policy) = tokio::join!(
            self.load(agent),
            self.load(window),
            self.load(bank),
        );
        let levels = [
            (CommissionSource::Agent, agent_policy?),
            (CommissionSource::Window, window_policy?),
            (CommissionSource::Bank, bank_policy?),
        ];

        for (source, cached) in levels {
            match &*cached {
                CachedPolicy::Missing => continue,
                CachedPolicy::Degraded => {
                    return Ok(PolicySelection {
                        source: CommissionSource::Fallback,
                        policy: None,
                    });
                }
                CachedPolicy::Valid(policy) => {
                    if !policy.is_effective(today) {
                        warn!(?source, %today, "owning commission policy outside its validity window, falling back to 0%");
                        return Ok(PolicySelection {
                            source: CommissionSource::Fallback,
                            policy: None,
                        });
                    }
                    return Ok(PolicySelection {
                        source,
                        policy: Some(policy.clone()),
                    });
                }
            }
        }
        Ok(PolicySelection {
            source: CommissionSource::Fallback,
            policy: None,
        })
    }

    /// Freeze the snapshot for one play under an already-selected policy.
    pub fn snapshot(
        &self,
        selection: &PolicySelection,
        draw: &str,
        kind: PlayKind,
        multiplier_value: Option<f64>,
        stake: f64,
    ) -> CommissionSnapshot {
        let (percent, rule) = match &selection.policy {
            Some(policy) => policy.percent_for(draw, kind, multiplier_value),
            None => (0.0, None),
        };
        CommissionSnapshot {
            percent,
            amount: money::commission_amount(stake, percent),
            source: selection.source,
            rule,
        }
    }

    async fn load(&self, owner: &str) -> RepoResult<Arc<CachedPolicy>> {
        if let Some(cached) = self.cache.get(owner) {
            return Ok(cached);
        }
        let state = match self.policies.find_by_owner(owner).await? {
            None => CachedPolicy::Missing,
            Some(record) => match CommissionPolicy::parse(&record.document) {
                Ok(policy) => CachedPolicy::Valid(Arc::new(policy)),
                Err(reason) => {
                    warn!(%owner, %reason, "malformed commission policy document, treating as 0% fallback");
                    CachedPolicy::Degraded
                }
            },
        };
        Ok(self.cache.put(owner, state))
    }

    /// Invalidation hook for policy writers.
    pub fn invalidate(&self, owner: &str) {
        self.cache.invalidate(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use serde_json::json;

    async fn seed_policy(db: &DbService, owner: &str, document: serde_json::Value) {
        db.db()
            .query("CREATE commission_policy CONTENT { owner: $owner, version: 1, document: $document }")
            .bind(("owner", owner.to_string()))
            .bind(("document", document))
            .await
            .unwrap()
            .check()
            .unwrap();
    }

    fn today() -> NaiveDate {
        "2026-03-15".parse().unwrap()
    }

    #[tokio::test]
    async fn test_agent_policy_shadows_window_and_bank() {
        let db = DbService::memory().await.unwrap();
        seed_policy(&db, "agent:a1", json!({ "default_percent": 7.0 })).await;
        seed_policy(&db, "window:w1", json!({ "default_percent": 5.0 })).await;
        seed_policy(&db, "bank:b1", json!({ "default_percent": 3.0 })).await;

        let resolver = CommissionResolver::new(db.db(), Duration::ZERO);
        let selection = resolver
            .select_policy("agent:a1", "window:w1", "bank:b1", today())
            .await
            .unwrap();
        assert_eq!(selection.source, CommissionSource::Agent);

        let snap = resolver.snapshot(&selection, "draw:d1", PlayKind::Number, Some(70.0), 200.0);
        assert_eq!(snap.percent, 7.0);
        assert_eq!(snap.amount, 14.0);
    }

    #[tokio::test]
    async fn test_window_wins_when_agent_has_none() {
        let db = DbService::memory().await.unwrap();
        seed_policy(&db, "window:w1", json!({ "default_percent": 5.0 })).await;
        seed_policy(&db, "bank:b1", json!({ "default_percent": 3.0 })).await;

        let resolver = CommissionResolver::new(db.db(), Duration::ZERO);
        let selection = resolver
            .select_policy("agent:a1", "window:w1", "bank:b1", today())
            .await
            .unwrap();
        assert_eq!(selection.source, CommissionSource::Window);
    }

    #[tokio::test]
    async fn test_no_policy_anywhere_is_zero_fallback() {
        let db = DbService::memory().await.unwrap();
        let resolver = CommissionResolver::new(db.db(), Duration::ZERO);
        let selection = resolver
            .select_policy("agent:a1", "window:w1", "bank:b1", today())
            .await
            .unwrap();
        assert_eq!(selection.source, CommissionSource::Fallback);

        let snap = resolver.snapshot(&selection, "draw:d1", PlayKind::Number, Some(70.0), 100.0);
        assert_eq!(snap.percent, 0.0);
        assert_eq!(snap.amount, 0.0);
        assert_eq!(snap.rule, None);
    }

    #[tokio::test]
    async fn test_malformed_owner_degrades_without_falling_through() {
        let db = DbService::memory().await.unwrap();
        seed_policy(&db, "agent:a1", json!({ "rules": "garbage" })).await;
        seed_policy(&db, "window:w1", json!({ "default_percent": 5.0 })).await;

        let resolver = CommissionResolver::new(db.db(), Duration::ZERO);
        let selection = resolver
            .select_policy("agent:a1", "window:w1", "bank:b1", today())
            .await
            .unwrap();
        // The broken agent policy still owns the sale; it must not fall
        // through to the window's 5%.
        assert_eq!(selection.source, CommissionSource::Fallback);
        let snap = resolver.snapshot(&selection, "draw:d1", PlayKind::Number, None, 100.0);
        assert_eq!(snap.percent, 0.0);
    }

    #[tokio::test]
    async fn test_expired_policy_degrades() {
        let db = DbService::memory().await.unwrap();
        seed_policy(
            &db,
            "agent:a1",
            json!({ "default_percent": 9.0, "effective_to": "2026-01-31" }),
        )
        .await;

        let resolver = CommissionResolver::new(db.db(), Duration::ZERO);
        let selection = resolver
            .select_policy("agent:a1", "window:w1", "bank:b1", today())
            .await
            .unwrap();
        assert_eq!(selection.source, CommissionSource::Fallback);
    }
}
