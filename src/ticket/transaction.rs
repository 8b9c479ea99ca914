//! Sale transaction engine
//!
//! `TicketEngine::sell` is the single entry point for selling a ticket.
//! Validation and entity checks happen once, up front; everything that can
//! be invalidated by concurrent sales (multiplier records, restriction
//! totals, the sequence counter) is re-read inside each attempt, and each
//! attempt persists atomically or not at all.

use super::cutoff;
use super::types::{PlayInput, SaleReceipt, SaleRequest};
use crate::commission::CommissionResolver;
use crate::config::EngineConfig;
use crate::db::models::{Agent, Bank, Draw, DrawStatus, MultiplierSource, PlayKind, Window};
use crate::db::repository::{
    DrawRepository, EntityRepository, PlayContent, TicketDraft, TicketRepository,
};
use crate::error::SaleError;
use crate::multiplier::{MultiplierResolver, ResolvedMultiplier};
use crate::restriction::{PendingPlay, RestrictionEngine, SaleContext};
use crate::retry::{self, RetryPolicy};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::Semaphore;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct TicketEngine {
    config: EngineConfig,
    entities: EntityRepository,
    draws: DrawRepository,
    tickets: TicketRepository,
    multiplier: MultiplierResolver,
    commission: CommissionResolver,
    restriction: RestrictionEngine,
    slots: Arc<Semaphore>,
}

impl TicketEngine {
    pub fn new(db: Surreal<Db>, config: EngineConfig) -> Self {
        let cache_ttl = Duration::from_millis(config.rule_cache_ttl_ms);
        Self {
            entities: EntityRepository::new(db.clone()),
            draws: DrawRepository::new(db.clone()),
            tickets: TicketRepository::new(db.clone()),
            multiplier: MultiplierResolver::new(db.clone(), config.default_multiplier),
            commission: CommissionResolver::new(db.clone(), cache_ttl),
            restriction: RestrictionEngine::new(db, cache_ttl),
            slots: Arc::new(Semaphore::new(config.max_concurrent_sales)),
            config,
        }
    }

    /// Sell a ticket. On success the persisted aggregate is returned exactly
    /// as stored, with every snapshot frozen.
    #[instrument(skip(self, request), fields(agent = %request.agent, draw = %request.draw))]
    pub async fn sell(
        &self,
        request: &SaleRequest,
        operator: &str,
    ) -> Result<SaleReceipt, SaleError> {
        request.validate()?;

        let (agent, window, draw, bank) = self.load_entities(request).await?;

        let now = Utc::now();
        let minutes = cutoff::effective_cutoff_minutes(
            &agent,
            &window,
            &bank,
            self.config.default_cutoff_minutes,
        );
        cutoff::check_cutoff(&draw, minutes, self.config.cutoff_grace_secs, now)?;

        if request.plays.iter().any(|p| p.kind == PlayKind::Boosted)
            && !self.draws.has_active_boost(&request.draw).await?
        {
            return Err(SaleError::InvalidPlay(format!(
                "draw {} does not offer the boost side-bet",
                request.draw
            )));
        }

        let policy = RetryPolicy::from(&self.config);
        let receipt = retry::run(&policy, |attempt| {
            self.attempt_sale(attempt, request, &agent, &draw, operator)
        })
        .await?;

        info!(
            sequence = receipt.ticket.ticket.sequence,
            plays = receipt.ticket.plays.len(),
            total = receipt.ticket.ticket.total_amount,
            "ticket sold"
        );
        Ok(receipt)
    }

    async fn load_entities(
        &self,
        request: &SaleRequest,
    ) -> Result<(Agent, Window, Draw, Bank), SaleError> {
        let (agent, window, draw, product) = tokio::join!(
            self.entities.find_agent(&request.agent),
            self.entities.find_window(&request.window),
            self.draws.find_by_id(&request.draw),
            self.entities.find_product(&request.product),
        );
        let agent = agent?.ok_or_else(|| SaleError::NotFound(format!("agent {}", request.agent)))?;
        let window =
            window?.ok_or_else(|| SaleError::NotFound(format!("window {}", request.window)))?;
        let draw = draw?.ok_or_else(|| SaleError::NotFound(format!("draw {}", request.draw)))?;
        let product =
            product?.ok_or_else(|| SaleError::NotFound(format!("product {}", request.product)))?;

        if !agent.is_active {
            return Err(SaleError::Inactive(format!("agent {}", request.agent)));
        }
        if !window.is_active {
            return Err(SaleError::Inactive(format!("window {}", request.window)));
        }
        if !product.is_active {
            return Err(SaleError::Inactive(format!("product {}", request.product)));
        }
        if agent.window != request.window {
            return Err(SaleError::Mismatch(format!(
                "agent {} does not sell under window {}",
                request.agent, request.window
            )));
        }
        if window.bank != agent.bank {
            return Err(SaleError::Mismatch(format!(
                "window {} does not belong to bank {}",
                request.window, agent.bank
            )));
        }
        if draw.product != request.product {
            return Err(SaleError::Mismatch(format!(
                "draw {} does not belong to product {}",
                request.draw, request.product
            )));
        }
        if draw.status != DrawStatus::Open {
            return Err(SaleError::DrawNotOpen(request.draw.clone()));
        }

        let bank = self
            .entities
            .find_bank(&agent.bank)
            .await?
            .ok_or_else(|| SaleError::NotFound(format!("bank {}", agent.bank)))?;
        if !bank.is_active {
            return Err(SaleError::Inactive(format!("bank {}", agent.bank)));
        }
        Ok((agent, window, draw, bank))
    }

    /// One attempt, bounded by the slot wait and the transaction budget.
    /// Everything here is rebuilt from scratch on retry, including the
    /// ticket's record key.
    async fn attempt_sale(
        &self,
        attempt: u32,
        request: &SaleRequest,
        agent: &Agent,
        draw: &Draw,
        operator: &str,
    ) -> Result<SaleReceipt, SaleError> {
        let slot_wait = Duration::from_millis(self.config.txn_slot_timeout_ms);
        let _permit = tokio::time::timeout(slot_wait, self.slots.acquire())
            .await
            .map_err(|_| {
                SaleError::Busy(format!(
                    "no transaction slot within {}ms",
                    self.config.txn_slot_timeout_ms
                ))
            })?
            .map_err(|_| SaleError::Internal("transaction slots closed".to_string()))?;

        let budget = Duration::from_millis(self.config.txn_timeout_ms);
        tokio::time::timeout(
            budget,
            self.attempt_inner(request, agent, draw, operator),
        )
        .await
        .map_err(|_| {
            SaleError::Timeout(format!(
                "sale attempt {attempt} exceeded {}ms",
                self.config.txn_timeout_ms
            ))
        })?
    }

    async fn attempt_inner(
        &self,
        request: &SaleRequest,
        agent: &Agent,
        draw: &Draw,
        operator: &str,
    ) -> Result<SaleReceipt, SaleError> {
        let now = Utc::now();
        let resolved = self
            .multiplier
            .resolve(&request.agent, &request.window, &agent.bank, draw)
            .await?;

        let pending: Vec<PendingPlay> = request
            .plays
            .iter()
            .map(|p| PendingPlay {
                kind: p.kind,
                number: p.number.clone(),
                amount: p.amount,
                multiplier: match p.kind {
                    PlayKind::Number => resolved.record.clone(),
                    PlayKind::Boosted => None,
                },
            })
            .collect();

        let ctx = SaleContext {
            bank: agent.bank.clone(),
            window: request.window.clone(),
            agent: request.agent.clone(),
            draw: request.draw.clone(),
            is_privileged: agent.is_privileged,
            now: now.naive_utc(),
        };
        let clearance = self.restriction.check(&pending, &ctx).await?;

        let selection = self
            .commission
            .select_policy(&request.agent, &request.window, &agent.bank, now.date_naive())
            .await?;

        let draft = TicketDraft {
            key: Uuid::new_v4().simple().to_string(),
            draw: request.draw.clone(),
            window: request.window.clone(),
            agent: request.agent.clone(),
            total_amount: request.total_amount,
            created_at: now.to_rfc3339(),
        };
        let contents: Vec<PlayContent> = request
            .plays
            .iter()
            .map(|p| self.play_content(p, request, &draft, &resolved, &selection))
            .collect();

        self.tickets
            .create_with_plays(
                &draft,
                &contents,
                operator,
                now.timestamp_millis(),
                &clearance.guards,
            )
            .await?;

        let ticket = self
            .tickets
            .find_with_plays(&draft.key)
            .await?
            .ok_or_else(|| {
                SaleError::Internal(format!("committed ticket {} not readable", draft.key))
            })?;

        Ok(SaleReceipt {
            ticket,
            warnings: clearance.warnings,
        })
    }

    fn play_content(
        &self,
        play: &PlayInput,
        request: &SaleRequest,
        draft: &TicketDraft,
        resolved: &ResolvedMultiplier,
        selection: &crate::commission::PolicySelection,
    ) -> PlayContent {
        let multiplier_value = match play.kind {
            PlayKind::Number => Some(resolved.value),
            PlayKind::Boosted => None,
        };
        let snapshot = self.commission.snapshot(
            selection,
            &request.draw,
            play.kind,
            multiplier_value,
            play.amount,
        );
        PlayContent {
            ticket: format!("ticket:{}", draft.key),
            draw: request.draw.clone(),
            window: request.window.clone(),
            agent: request.agent.clone(),
            kind: play.kind,
            number: play.number.clone(),
            boost_number: play.boost_number.clone(),
            amount: play.amount,
            multiplier: match play.kind {
                PlayKind::Number => resolved.record.clone(),
                PlayKind::Boosted => None,
            },
            multiplier_value: multiplier_value.unwrap_or(0.0),
            multiplier_source: match play.kind {
                PlayKind::Number => resolved.source,
                PlayKind::Boosted => MultiplierSource::Default,
            },
            commission_percent: snapshot.percent,
            commission_amount: snapshot.amount,
            commission_source: snapshot.source,
            commission_rule: snapshot.rule,
            is_active: true,
            is_excluded: false,
        }
    }
}
