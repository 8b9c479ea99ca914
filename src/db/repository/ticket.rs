//! Ticket Repository
//!
//! Owns the atomic sale transaction (counter increment, ticket, plays and
//! the audit entry in one commit) plus the accumulated-sales queries the
//! restriction engine depends on. Accumulations are always read fresh from
//! the database, scoped to the draw; inactive or excluded plays never
//! count.

use super::{BaseRepository, RepoResult, strip_table_prefix};
use crate::db::models::{CommissionSource, MultiplierSource, Play, PlayKind, Ticket};
use crate::sequence::ALLOCATE_STMT;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Write-side ticket fields; the sequence number is assigned in-transaction.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    /// Client-generated record key so the aggregate can be re-read after commit
    pub key: String,
    pub draw: String,
    pub window: String,
    pub agent: String,
    pub total_amount: f64,
    pub created_at: String,
}

/// Write-side play content, fully resolved (multiplier and commission
/// snapshots frozen) before it reaches the database.
#[derive(Debug, Clone, Serialize)]
pub struct PlayContent {
    pub ticket: String,
    pub draw: String,
    pub window: String,
    pub agent: String,
    pub kind: PlayKind,
    pub number: String,
    pub boost_number: Option<String>,
    pub amount: f64,
    pub multiplier: Option<String>,
    pub multiplier_value: f64,
    pub multiplier_source: MultiplierSource,
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub commission_source: CommissionSource,
    pub commission_rule: Option<String>,
    pub is_active: bool,
    pub is_excluded: bool,
}

/// Persisted ticket together with its plays.
#[derive(Debug, Clone)]
pub struct TicketAggregate {
    pub ticket: Ticket,
    pub plays: Vec<Play>,
}

/// An accumulated-cap condition revalidated inside the sale transaction.
///
/// The restriction engine's pre-check reads totals in their own
/// transactions, so a concurrent sale can land between that read and this
/// write. Each guard re-derives the accumulated total (and the dynamic
/// limit, when configured) inside the write transaction and aborts it when
/// the cap would be exceeded; the abort is classified as a conflict, and
/// the retried attempt's pre-check then rejects with full context.
#[derive(Debug, Clone, PartialEq)]
pub struct CapGuard {
    pub number: String,
    /// Multiplier filter carried over from the rule, narrowing the sum
    pub multiplier: Option<String>,
    /// This ticket's stake on the number under the rule
    pub contribution: f64,
    pub max_total: Option<f64>,
    pub base_amount: Option<f64>,
    pub sales_percent: Option<f64>,
    pub per_agent_sales: bool,
}

#[derive(Debug, Deserialize)]
struct SumRow {
    total: Option<f64>,
}

/// Render the in-transaction revalidation statements for the cap guards.
///
/// The statements run before any play row is created, so the sums never
/// include this ticket's own contribution. The THROW message is worded so
/// the error classifier treats the abort as a retryable conflict; the
/// retried attempt's pre-check then produces the caller-facing violation.
fn render_cap_guards(guards: &[CapGuard]) -> String {
    let mut stmts = String::new();
    for (i, guard) in guards.iter().enumerate() {
        let multiplier_clause = if guard.multiplier.is_some() {
            format!(" AND kind = 'NUMBER' AND multiplier = $g{i}_mult")
        } else {
            String::new()
        };
        stmts.push_str(&format!(
            "LET $g{i}_acc = math::sum((SELECT VALUE amount FROM play \
             WHERE draw = $draw AND number = $g{i}_number \
             AND is_active = true AND is_excluded = false{multiplier_clause}));\n"
        ));
        if guard.base_amount.is_some() || guard.sales_percent.is_some() {
            let agent_clause = if guard.per_agent_sales {
                " AND agent = $agent"
            } else {
                ""
            };
            stmts.push_str(&format!(
                "LET $g{i}_sales = math::sum((SELECT VALUE amount FROM play \
                 WHERE draw = $draw AND is_active = true AND is_excluded = false{agent_clause}));\n\
                 LET $g{i}_dyn = $g{i}_base + $g{i}_pct * $g{i}_sales / 100;\n"
            ));
            if guard.max_total.is_some() {
                stmts.push_str(&format!(
                    "LET $g{i}_limit = math::min([$g{i}_dyn, $g{i}_max]);\n"
                ));
            } else {
                stmts.push_str(&format!("LET $g{i}_limit = $g{i}_dyn;\n"));
            }
        } else {
            stmts.push_str(&format!("LET $g{i}_limit = $g{i}_max;\n"));
        }
        stmts.push_str(&format!(
            "IF $g{i}_acc + $g{i}_amt > $g{i}_limit {{ \
             THROW string::concat('cap conflict on number ', $g{i}_number); }};\n"
        ));
    }
    stmts
}

#[derive(Clone)]
pub struct TicketRepository {
    base: BaseRepository,
}

impl TicketRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// The atomic unit of the sale: one transaction that increments the
    /// sequence counter (first write, so contention is resolved early),
    /// revalidates the accumulated caps, creates the ticket and its plays,
    /// and appends the hash-chained audit entry. Nothing is externally
    /// visible until the commit, which is what makes a from-scratch retry
    /// safe.
    pub async fn create_with_plays(
        &self,
        draft: &TicketDraft,
        plays: &[PlayContent],
        operator: &str,
        timestamp_ms: i64,
        guards: &[CapGuard],
    ) -> RepoResult<()> {
        let guard_stmts = render_cap_guards(guards);
        let query = format!(
            r#"
            BEGIN TRANSACTION;
            {ALLOCATE_STMT}
            {guard_stmts}
            CREATE type::thing('ticket', $ticket_key) CONTENT {{
                sequence: $seq,
                draw: $draw,
                window: $window,
                agent: $agent,
                total_amount: $total_amount,
                status: 'ACTIVE',
                is_winner: false,
                total_payout: 0.0,
                total_paid: 0.0,
                remaining_payable: 0.0,
                is_excluded: false,
                created_at: $created_at,
            }};
            FOR $play IN $plays {{ CREATE play CONTENT $play; }};
            LET $prev = (SELECT curr_hash, seq FROM audit_log ORDER BY seq DESC LIMIT 1)[0].curr_hash ?? '';
            CREATE audit_log CONTENT {{
                seq: $seq,
                timestamp: $timestamp,
                action: $action,
                resource_type: 'ticket',
                resource_id: $ticket_id,
                operator_id: $operator,
                details: {{ sequence: $seq, total_amount: $total_amount }},
                prev_hash: $prev,
                curr_hash: crypto::sha256(string::concat(
                    $prev, '|', <string>$seq, '|', $action, '|', $ticket_id, '|', $operator
                )),
            }};
            COMMIT TRANSACTION;
            "#
        );

        let mut request = self
            .base
            .db()
            .query(query)
            .bind(("ticket_key", draft.key.clone()))
            .bind(("ticket_id", format!("ticket:{}", draft.key)))
            .bind(("draw", draft.draw.clone()))
            .bind(("window", draft.window.clone()))
            .bind(("agent", draft.agent.clone()))
            .bind(("total_amount", draft.total_amount))
            .bind(("created_at", draft.created_at.clone()))
            .bind(("plays", plays.to_vec()))
            .bind(("timestamp", timestamp_ms))
            .bind(("action", "ticket_sold".to_string()))
            .bind(("operator", operator.to_string()));
        for (i, guard) in guards.iter().enumerate() {
            request = request
                .bind((format!("g{i}_number"), guard.number.clone()))
                .bind((format!("g{i}_amt"), guard.contribution));
            if let Some(multiplier) = &guard.multiplier {
                request = request.bind((format!("g{i}_mult"), multiplier.clone()));
            }
            if let Some(max_total) = guard.max_total {
                request = request.bind((format!("g{i}_max"), max_total));
            }
            if guard.base_amount.is_some() || guard.sales_percent.is_some() {
                request = request
                    .bind((format!("g{i}_base"), guard.base_amount.unwrap_or(0.0)))
                    .bind((format!("g{i}_pct"), guard.sales_percent.unwrap_or(0.0)));
            }
        }
        request.await?.check()?;
        Ok(())
    }

    /// Re-read the persisted aggregate after the commit.
    pub async fn find_with_plays(&self, key: &str) -> RepoResult<Option<TicketAggregate>> {
        let key = strip_table_prefix("ticket", key);
        let ticket: Option<Ticket> = self.base.db().select(("ticket", key)).await?;
        let Some(ticket) = ticket else {
            return Ok(None);
        };

        let mut result = self
            .base
            .db()
            .query("SELECT * FROM play WHERE ticket = $ticket ORDER BY number")
            .bind(("ticket", format!("ticket:{key}")))
            .await?;
        let plays: Vec<Play> = result.take(0)?;
        Ok(Some(TicketAggregate { ticket, plays }))
    }

    pub async fn find_by_sequence(&self, sequence: i64) -> RepoResult<Option<Ticket>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM ticket WHERE sequence = $sequence LIMIT 1")
            .bind(("sequence", sequence))
            .await?;
        let tickets: Vec<Ticket> = result.take(0)?;
        Ok(tickets.into_iter().next())
    }

    pub async fn all_sequences(&self) -> RepoResult<Vec<i64>> {
        #[derive(Deserialize)]
        struct SeqRow {
            sequence: i64,
        }
        let mut result = self
            .base
            .db()
            .query("SELECT sequence FROM ticket ORDER BY sequence")
            .await?;
        let rows: Vec<SeqRow> = result.take(0)?;
        Ok(rows.into_iter().map(|r| r.sequence).collect())
    }

    /// Accumulated stake for a number within a draw.
    ///
    /// Without a multiplier filter both plain and boosted plays targeting
    /// the number count. With a filter, boosted plays are excluded: their
    /// payout multiplier is not resolved at sale time.
    pub async fn accumulated_for_number(
        &self,
        draw: &str,
        number: &str,
        multiplier: Option<&str>,
    ) -> RepoResult<f64> {
        let mut query = String::from(
            "SELECT math::sum(amount) AS total FROM play \
             WHERE draw = $draw AND number = $number \
             AND is_active = true AND is_excluded = false",
        );
        if multiplier.is_some() {
            query.push_str(" AND kind = 'NUMBER' AND multiplier = $multiplier");
        }
        query.push_str(" GROUP ALL");

        let mut request = self
            .base
            .db()
            .query(query)
            .bind(("draw", draw.to_string()))
            .bind(("number", number.to_string()));
        if let Some(m) = multiplier {
            request = request.bind(("multiplier", m.to_string()));
        }
        let mut result = request.await?;
        let rows: Vec<SumRow> = result.take(0)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.total)
            .unwrap_or(0.0))
    }

    /// Total observed sales in a draw, optionally scoped to one agent
    /// (dynamic-cap input).
    pub async fn draw_sales(&self, draw: &str, agent: Option<&str>) -> RepoResult<f64> {
        let mut query = String::from(
            "SELECT math::sum(amount) AS total FROM play \
             WHERE draw = $draw AND is_active = true AND is_excluded = false",
        );
        if agent.is_some() {
            query.push_str(" AND agent = $agent");
        }
        query.push_str(" GROUP ALL");

        let mut request = self.base.db().query(query).bind(("draw", draw.to_string()));
        if let Some(a) = agent {
            request = request.bind(("agent", a.to_string()));
        }
        let mut result = request.await?;
        let rows: Vec<SumRow> = result.take(0)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.total)
            .unwrap_or(0.0))
    }
}
