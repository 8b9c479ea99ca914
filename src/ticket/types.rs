//! Sale request and receipt types

use crate::db::models::PlayKind;
use crate::db::repository::TicketAggregate;
use crate::error::SaleError;
use crate::money;
use serde::Deserialize;

/// One requested play line.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayInput {
    pub kind: PlayKind,
    /// Wagered number, "00".."99"
    pub number: String,
    /// Second number for the boost side-bet, when the buyer picks one
    #[serde(default)]
    pub boost_number: Option<String>,
    pub amount: f64,
}

/// A ticket purchase as submitted by the selling terminal. The declared
/// total is an integrity check, not an input to any calculation.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    pub draw: String,
    pub product: String,
    pub window: String,
    pub agent: String,
    pub plays: Vec<PlayInput>,
    pub total_amount: f64,
}

impl SaleRequest {
    /// Shape validation; everything that needs no database access.
    pub fn validate(&self) -> Result<(), SaleError> {
        if self.plays.is_empty() {
            return Err(SaleError::InvalidPlay(
                "ticket must contain at least one play".to_string(),
            ));
        }
        for play in &self.plays {
            money::validate_number(&play.number)?;
            money::validate_stake(play.amount)?;
            match play.kind {
                PlayKind::Number => {
                    if play.boost_number.is_some() {
                        return Err(SaleError::InvalidPlay(
                            "boost_number is only valid on boosted plays".to_string(),
                        ));
                    }
                }
                PlayKind::Boosted => {
                    if let Some(boost) = play.boost_number.as_deref() {
                        money::validate_number(boost)?;
                    }
                }
            }
        }
        let stakes: Vec<f64> = self.plays.iter().map(|p| p.amount).collect();
        money::check_total(&stakes, self.total_amount)
    }
}

/// The persisted outcome of a successful sale, plus any advisory warnings
/// the restriction engine produced for privileged agents.
#[derive(Debug, Clone)]
pub struct SaleReceipt {
    pub ticket: TicketAggregate,
    pub warnings: Vec<String>,
}
