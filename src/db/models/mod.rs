//! Database models

pub mod commission;
pub mod draw;
pub mod entity;
pub mod multiplier_override;
pub mod restriction_rule;
pub mod serde_helpers;
pub mod ticket;

pub use commission::CommissionPolicyRecord;
pub use draw::{BASE_MULTIPLIER_NAME, Draw, DrawMultiplier, DrawRules, DrawStatus, MultiplierKind};
pub use entity::{Agent, Bank, Product, Window};
pub use multiplier_override::{AgentMultiplierOverride, BankDrawMultiplier, WindowMultiplierOverride};
pub use restriction_rule::RestrictionRule;
pub use ticket::{CommissionSource, MultiplierSource, Play, PlayKind, Ticket, TicketStatus};
