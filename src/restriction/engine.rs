//! Restriction evaluation
//!
//! Order of evaluation is agent rules, then window rules, then bank rules;
//! the first violated rule rejects the whole ticket. Accumulated totals are
//! read fresh on every check so a cap can never be overshot by a stale
//! read; only the rule documents themselves pass through the TTL cache.

use super::matcher::{rule_matches_play, scope_of, scope_rank};
use super::types::{Clearance, PendingPlay, RuleScope, SaleContext, Violation};
use crate::cache::TtlCache;
use crate::db::models::RestrictionRule;
use crate::db::repository::{CapGuard, RestrictionRuleRepository, TicketRepository};
use crate::error::SaleError;
use crate::money::{to_decimal, to_f64};
use std::collections::BTreeMap;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, warn};

pub struct RestrictionEngine {
    rules: RestrictionRuleRepository,
    tickets: TicketRepository,
    cache: TtlCache<Vec<RestrictionRule>>,
}

impl RestrictionEngine {
    pub fn new(db: Surreal<Db>, cache_ttl: Duration) -> Self {
        Self {
            rules: RestrictionRuleRepository::new(db.clone()),
            tickets: TicketRepository::new(db),
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Evaluate every applicable rule against the pending plays. Returns
    /// the clearance (warnings plus the cap conditions to revalidate inside
    /// the write transaction); the first hard violation rejects the ticket.
    pub async fn check(
        &self,
        plays: &[PendingPlay],
        ctx: &SaleContext,
    ) -> Result<Clearance, SaleError> {
        let mut rules = self.applicable_rules(ctx).await?;
        rules.sort_by_key(scope_rank);

        let mut clearance = Clearance::default();
        for rule in &rules {
            let matched: Vec<&PendingPlay> = plays
                .iter()
                .filter(|p| rule_matches_play(rule, p, ctx.now))
                .collect();
            if matched.is_empty() {
                continue;
            }

            if rule.has_no_caps() {
                let Some(multiplier) = rule.multiplier.clone() else {
                    // A rule with neither caps nor a multiplier filter has
                    // nothing to enforce.
                    continue;
                };
                if ctx.is_privileged {
                    let note = format!(
                        "multiplier {multiplier} is blocked but agent {} is privileged",
                        ctx.agent
                    );
                    warn!(agent = %ctx.agent, %multiplier, "selling through a blocked multiplier");
                    clearance.warnings.push(note);
                    continue;
                }
                return Err(SaleError::MultiplierBlocked { multiplier });
            }

            self.check_caps(rule, &matched, ctx, &mut clearance.guards)
                .await?;
        }
        Ok(clearance)
    }

    /// Cap evaluation for one rule, per target number. Accumulated and
    /// dynamic caps that pass here are also appended to `guards` for
    /// in-transaction revalidation.
    async fn check_caps(
        &self,
        rule: &RestrictionRule,
        matched: &[&PendingPlay],
        ctx: &SaleContext,
        guards: &mut Vec<CapGuard>,
    ) -> Result<(), SaleError> {
        let scope = scope_of(rule);

        // A ticket may stake the same number across several plays; the cap
        // applies to their sum.
        let mut by_number: BTreeMap<&str, f64> = BTreeMap::new();
        for play in matched {
            let entry = by_number.entry(play.number.as_str()).or_insert(0.0);
            *entry = to_f64(to_decimal(*entry) + to_decimal(play.amount));
        }

        for (number, ticket_sum) in by_number {
            if let Some(max_amount) = rule.max_amount {
                if ticket_sum > max_amount {
                    return Err(violation(
                        scope,
                        number,
                        ticket_sum,
                        max_amount,
                        "per-ticket limit",
                    ));
                }
            }

            let has_dynamic = rule.base_amount.is_some() || rule.sales_percent.is_some();
            if rule.max_total.is_none() && !has_dynamic {
                continue;
            }

            let accumulated = self
                .tickets
                .accumulated_for_number(&ctx.draw, number, rule.multiplier.as_deref())
                .await?;
            let attempted = to_f64(to_decimal(accumulated) + to_decimal(ticket_sum));

            let mut limit: Option<f64> = rule.max_total;
            if has_dynamic {
                let mut dynamic = to_decimal(rule.base_amount.unwrap_or(0.0));
                if let Some(percent) = rule.sales_percent {
                    let agent_scope = rule.per_agent_sales.then_some(ctx.agent.as_str());
                    let sales = self.tickets.draw_sales(&ctx.draw, agent_scope).await?;
                    dynamic += to_decimal(sales) * to_decimal(percent)
                        / rust_decimal::Decimal::ONE_HUNDRED;
                }
                let dynamic = to_f64(dynamic);
                limit = Some(match limit {
                    Some(fixed) => fixed.min(dynamic),
                    None => dynamic,
                });
            }

            if let Some(limit) = limit {
                debug!(
                    %number, accumulated, ticket_sum, limit,
                    "evaluating accumulated cap"
                );
                if attempted > limit {
                    return Err(violation(
                        scope,
                        number,
                        attempted,
                        limit,
                        "accumulated limit for the draw",
                    ));
                }
            }

            guards.push(CapGuard {
                number: number.to_string(),
                multiplier: rule.multiplier.clone(),
                contribution: ticket_sum,
                max_total: rule.max_total,
                base_amount: rule.base_amount,
                sales_percent: rule.sales_percent,
                per_agent_sales: rule.per_agent_sales,
            });
        }
        Ok(())
    }

    async fn applicable_rules(&self, ctx: &SaleContext) -> Result<Vec<RestrictionRule>, SaleError> {
        let key = format!("{}|{}|{}", ctx.bank, ctx.window, ctx.agent);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.as_ref().clone());
        }
        let rules = self
            .rules
            .find_applicable(&ctx.bank, &ctx.window, &ctx.agent)
            .await?;
        self.cache.put(key, rules.clone());
        Ok(rules)
    }

    /// Invalidation hook for rule writers.
    pub fn invalidate(&self, bank: &str, window: &str, agent: &str) {
        self.cache.invalidate(&format!("{bank}|{window}|{agent}"));
    }
}

fn violation(scope: RuleScope, number: &str, attempted: f64, limit: f64, what: &str) -> SaleError {
    SaleError::Restricted(Box::new(Violation {
        scope,
        number: Some(number.to_string()),
        attempted,
        limit,
        message: format!("Number {number} exceeds {what}: attempted {attempted}, limit {limit}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::PlayKind;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn ctx() -> SaleContext {
        SaleContext {
            bank: "bank:b1".to_string(),
            window: "window:w1".to_string(),
            agent: "agent:a1".to_string(),
            draw: "draw:d1".to_string(),
            is_privileged: false,
            now: NaiveDateTime::parse_from_str("2026-03-15 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    fn play(number: &str, amount: f64) -> PendingPlay {
        PendingPlay {
            kind: PlayKind::Number,
            number: number.to_string(),
            amount,
            multiplier: Some("draw_multiplier:base".to_string()),
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

    fn engine(db: &DbService) -> RestrictionEngine {
        RestrictionEngine::new(db.db(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_per_ticket_cap() {
        let db = DbService::memory().await.unwrap();
        seed(
            &db,
            "restriction_rule",
            json!({ "bank": "bank:b1", "number": "07", "max_amount": 1000.0, "is_active": true }),
        )
        .await;

        let engine = engine(&db);
        // Two plays on the same number accumulate within the ticket
        let ok = engine
            .check(&[play("07", 600.0), play("07", 400.0)], &ctx())
            .await;
        assert!(ok.is_ok());

        let err = engine
            .check(&[play("07", 600.0), play("07", 401.0)], &ctx())
            .await
            .unwrap_err();
        match err {
            SaleError::Restricted(v) => {
                assert_eq!(v.scope, RuleScope::Bank);
                assert_eq!(v.number.as_deref(), Some("07"));
                assert_eq!(v.limit, 1000.0);
                assert_eq!(v.attempted, 1001.0);
            }
            other => panic!("expected Restricted, got {other:?}"),
        }

        // Other numbers are untouched
        assert!(engine.check(&[play("08", 5000.0)], &ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn test_accumulated_cap_reads_fresh_totals() {
        let db = DbService::memory().await.unwrap();
        seed(
            &db,
            "restriction_rule",
            json!({ "window": "window:w1", "number": "07", "max_total": 3000.0, "is_active": true }),
        )
        .await;
        // 2500 already sold on 07 in this draw
        seed(
            &db,
            "play",
            json!({
                "ticket": "ticket:t0", "draw": "draw:d1", "window": "window:w9",
                "agent": "agent:a9", "kind": "NUMBER", "number": "07",
                "amount": 2500.0, "multiplier_value": 70.0,
                "multiplier_source": "draw_base", "commission_percent": 0.0,
                "commission_amount": 0.0, "commission_source": "fallback",
                "is_active": true, "is_excluded": false
            }),
        )
        .await;

        let engine = engine(&db);
        assert!(engine.check(&[play("07", 500.0)], &ctx()).await.is_ok());

        let err = engine
            .check(&[play("07", 501.0)], &ctx())
            .await
            .unwrap_err();
        match err {
            SaleError::Restricted(v) => {
                assert_eq!(v.scope, RuleScope::Window);
                assert_eq!(v.attempted, 3001.0);
                assert_eq!(v.limit, 3000.0);
            }
            other => panic!("expected Restricted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dynamic_cap_scales_with_sales() {
        let db = DbService::memory().await.unwrap();
        // limit = 1000 + 10% of draw sales
        seed(
            &db,
            "restriction_rule",
            json!({
                "bank": "bank:b1", "number": "07",
                "base_amount": 1000.0, "sales_percent": 10.0, "is_active": true
            }),
        )
        .await;
        // 5000 of total sales in the draw (not on 07)
        seed(
            &db,
            "play",
            json!({
                "ticket": "ticket:t0", "draw": "draw:d1", "window": "window:w9",
                "agent": "agent:a9", "kind": "NUMBER", "number": "11",
                "amount": 5000.0, "multiplier_value": 70.0,
                "multiplier_source": "draw_base", "commission_percent": 0.0,
                "commission_amount": 0.0, "commission_source": "fallback",
                "is_active": true, "is_excluded": false
            }),
        )
        .await;

        let engine = engine(&db);
        // limit = 1000 + 500 = 1500
        let clearance = engine.check(&[play("07", 1500.0)], &ctx()).await.unwrap();
        // The passed cap comes back as a guard for the write transaction
        assert_eq!(clearance.guards.len(), 1);
        assert_eq!(clearance.guards[0].number, "07");
        assert_eq!(clearance.guards[0].contribution, 1500.0);
        let err = engine
            .check(&[play("07", 1501.0)], &ctx())
            .await
            .unwrap_err();
        match err {
            SaleError::Restricted(v) => assert_eq!(v.limit, 1500.0),
            other => panic!("expected Restricted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_per_agent_dynamic_cap_ignores_other_agents_sales() {
        let db = DbService::memory().await.unwrap();
        // limit = 1000 + 10% of the *selling agent's* sales
        seed(
            &db,
            "restriction_rule",
            json!({
                "bank": "bank:b1", "number": "07",
                "base_amount": 1000.0, "sales_percent": 10.0,
                "per_agent_sales": true, "is_active": true
            }),
        )
        .await;
        let sold = |agent: &str, amount: f64| {
            json!({
                "ticket": "ticket:t0", "draw": "draw:d1", "window": "window:w9",
                "agent": agent, "kind": "NUMBER", "number": "11",
                "amount": amount, "multiplier_value": 70.0,
                "multiplier_source": "draw_base", "commission_percent": 0.0,
                "commission_amount": 0.0, "commission_source": "fallback",
                "is_active": true, "is_excluded": false
            })
        };
        // a1 has sold 5000; a9's 50000 must not widen a1's cap
        seed(&db, "play", sold("agent:a1", 5000.0)).await;
        seed(&db, "play", sold("agent:a9", 50_000.0)).await;

        let engine = engine(&db);
        // a1's limit = 1000 + 10% of 5000 = 1500, not 1000 + 10% of 55000
        assert!(engine.check(&[play("07", 1500.0)], &ctx()).await.is_ok());
        let err = engine
            .check(&[play("07", 1501.0)], &ctx())
            .await
            .unwrap_err();
        match err {
            SaleError::Restricted(v) => assert_eq!(v.limit, 1500.0),
            other => panic!("expected Restricted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multiplier_block_and_privilege() {
        let db = DbService::memory().await.unwrap();
        seed(
            &db,
            "restriction_rule",
            json!({
                "bank": "bank:b1",
                "multiplier": "draw_multiplier:base",
                "is_active": true
            }),
        )
        .await;

        let engine = engine(&db);
        let err = engine.check(&[play("07", 100.0)], &ctx()).await.unwrap_err();
        assert!(matches!(err, SaleError::MultiplierBlocked { .. }));

        let mut privileged = ctx();
        privileged.is_privileged = true;
        let clearance = engine
            .check(&[play("07", 100.0)], &privileged)
            .await
            .unwrap();
        assert_eq!(clearance.warnings.len(), 1);

        // Plays under a different multiplier are unaffected
        let other = PendingPlay {
            multiplier: Some("draw_multiplier:other".to_string()),
            ..play("07", 100.0)
        };
        assert!(engine.check(&[other], &ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn test_agent_rule_beats_bank_rule() {
        let db = DbService::memory().await.unwrap();
        // Agent rule is tighter and must be the one reported
        seed(
            &db,
            "restriction_rule",
            json!({ "agent": "agent:a1", "number": "07", "max_amount": 100.0, "is_active": true }),
        )
        .await;
        seed(
            &db,
            "restriction_rule",
            json!({ "bank": "bank:b1", "number": "07", "max_amount": 500.0, "is_active": true }),
        )
        .await;

        let engine = engine(&db);
        let err = engine.check(&[play("07", 200.0)], &ctx()).await.unwrap_err();
        match err {
            SaleError::Restricted(v) => assert_eq!(v.scope, RuleScope::Agent),
            other => panic!("expected Restricted, got {other:?}"),
        }
    }
}
