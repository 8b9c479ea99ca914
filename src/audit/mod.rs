//! Hash-chained audit log
//!
//! Every sale appends one entry whose hash covers the previous entry's
//! hash, making after-the-fact tampering detectable: editing or removing an
//! entry breaks every hash from that point on. Entries are written inside
//! the sale transaction itself (see the ticket repository); this module
//! owns reading and verifying the chain.

mod storage;
mod types;

pub use storage::AuditStorage;
pub use types::{AuditEntry, ChainBreak, ChainVerification};
