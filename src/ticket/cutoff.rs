//! Sales cutoff
//!
//! Sales stop a configurable number of minutes before the draw closes. The
//! cutoff is resolved agent-first (agent, then window, then bank, then the
//! engine default) and widened by a small grace period so a sale keyed in
//! just before the line is not rejected by clock skew between terminals.

use crate::db::models::{Agent, Bank, Draw, Window};
use crate::error::SaleError;
use chrono::{DateTime, Duration, Utc};

/// The cutoff minutes that apply to this seller.
pub(super) fn effective_cutoff_minutes(
    agent: &Agent,
    window: &Window,
    bank: &Bank,
    default_minutes: u32,
) -> u32 {
    agent
        .cutoff_minutes
        .or(window.cutoff_minutes)
        .or(bank.cutoff_minutes)
        .unwrap_or(default_minutes)
}

/// Reject the sale when `now` is past `close_at - minutes + grace`.
pub(super) fn check_cutoff(
    draw: &Draw,
    minutes: u32,
    grace_secs: u32,
    now: DateTime<Utc>,
) -> Result<(), SaleError> {
    let draw_id = draw
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let close_at = DateTime::parse_from_rfc3339(&draw.close_at)
        .map_err(|e| {
            SaleError::Internal(format!(
                "draw {draw_id} has unparseable close_at {:?}: {e}",
                draw.close_at
            ))
        })?
        .with_timezone(&Utc);

    let deadline =
        close_at - Duration::minutes(i64::from(minutes)) + Duration::seconds(i64::from(grace_secs));
    if now > deadline {
        return Err(SaleError::CutoffPassed {
            draw: draw_id,
            close_at: draw.close_at.clone(),
            minutes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DrawStatus;

    fn draw(close_at: &str) -> Draw {
        Draw {
            id: Some("draw:d1".parse().unwrap()),
            name: "Evening".to_string(),
            product: "product:p1".to_string(),
            status: DrawStatus::Open,
            close_at: close_at.to_string(),
            rules: None,
        }
    }

    fn entities(
        agent_cutoff: Option<u32>,
        window_cutoff: Option<u32>,
        bank_cutoff: Option<u32>,
    ) -> (Agent, Window, Bank) {
        (
            Agent {
                id: None,
                name: "a".to_string(),
                window: "window:w1".to_string(),
                bank: "bank:b1".to_string(),
                is_active: true,
                is_privileged: false,
                cutoff_minutes: agent_cutoff,
            },
            Window {
                id: None,
                name: "w".to_string(),
                bank: "bank:b1".to_string(),
                is_active: true,
                cutoff_minutes: window_cutoff,
            },
            Bank {
                id: None,
                name: "b".to_string(),
                is_active: true,
                cutoff_minutes: bank_cutoff,
            },
        )
    }

    #[test]
    fn test_cutoff_resolution_is_agent_first() {
        let (a, w, b) = entities(Some(2), Some(7), Some(9));
        assert_eq!(effective_cutoff_minutes(&a, &w, &b, 5), 2);
        let (a, w, b) = entities(None, Some(7), Some(9));
        assert_eq!(effective_cutoff_minutes(&a, &w, &b, 5), 7);
        let (a, w, b) = entities(None, None, Some(9));
        assert_eq!(effective_cutoff_minutes(&a, &w, &b, 5), 9);
        let (a, w, b) = entities(None, None, None);
        assert_eq!(effective_cutoff_minutes(&a, &w, &b, 5), 5);
    }

    #[test]
    fn test_cutoff_boundary_with_grace() {
        let d = draw("2026-03-15T20:00:00Z");
        let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();

        // cutoff 5 min, grace 30s: deadline 19:55:30
        assert!(check_cutoff(&d, 5, 30, at("2026-03-15T19:54:00Z")).is_ok());
        assert!(check_cutoff(&d, 5, 30, at("2026-03-15T19:55:30Z")).is_ok());
        let err = check_cutoff(&d, 5, 30, at("2026-03-15T19:55:31Z")).unwrap_err();
        match err {
            SaleError::CutoffPassed { minutes, .. } => assert_eq!(minutes, 5),
            other => panic!("expected CutoffPassed, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_close_at_is_internal_error() {
        let d = draw("tomorrow evening");
        let now = "2026-03-15T10:00:00Z".parse().unwrap();
        assert!(matches!(
            check_cutoff(&d, 5, 30, now),
            Err(SaleError::Internal(_))
        ));
    }
}
