//! Database Module
//!
//! Owns the embedded SurrealDB handle and the schema definitions the engine
//! relies on (the unique ticket-sequence index in particular).

pub mod models;
pub mod repository;

use repository::{RepoError, RepoResult};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

const NAMESPACE: &str = "taquilla";
const DATABASE: &str = "engine";

/// Database service owning the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    db: Surreal<Db>,
}

impl DbService {
    /// Open a RocksDB-backed database at `path`.
    pub async fn open(path: &str) -> RepoResult<Self> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| RepoError::Database(format!("Failed to open database: {e}")))?;
        Self::init(db).await
    }

    /// Open an in-memory database (tests).
    pub async fn memory() -> RepoResult<Self> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| RepoError::Database(format!("Failed to open database: {e}")))?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> RepoResult<Self> {
        db.use_ns(NAMESPACE).use_db(DATABASE).await?;
        define_schema(&db).await?;
        tracing::info!("Database ready (ns={NAMESPACE}, db={DATABASE})");
        Ok(Self { db })
    }

    pub fn db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}

/// Declare the indexes the sale transaction depends on.
///
/// The unique index on `ticket.sequence` is load-bearing: a duplicate
/// sequence surfaces as an index violation, which the retry wrapper treats
/// as a transient conflict.
async fn define_schema(db: &Surreal<Db>) -> RepoResult<()> {
    db.query(
        r#"
        DEFINE INDEX IF NOT EXISTS ticket_sequence ON TABLE ticket FIELDS sequence UNIQUE;
        DEFINE INDEX IF NOT EXISTS play_draw_number ON TABLE play FIELDS draw, number;
        DEFINE INDEX IF NOT EXISTS audit_seq ON TABLE audit_log FIELDS seq;
        "#,
    )
    .await?
    .check()
    .map_err(|e| RepoError::Database(format!("Failed to define schema: {e}")))?;
    Ok(())
}
