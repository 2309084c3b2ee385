//! redb-based document store with optimistic transactions
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(collection, key)` | JSON bytes | Document bodies |
//! | `versions` | `(collection, key)` | `u64` | Per-document commit counter |
//!
//! # Concurrency model
//!
//! Writes go through [`LedgerStore::run_transaction`]: every attempt reads
//! from one consistent snapshot (`begin_read`), records the version of each
//! document it touched, and buffers its writes. At commit time the versions
//! are re-checked inside a write transaction; redb serializes writers, so
//! the check and the apply are atomic. A mismatch means another transaction
//! committed in between; the whole work body is retried from scratch with a
//! fresh snapshot (optimistic concurrency, no locks held across attempts).
//!
//! An absent document has version 0, so create/create races are detected the
//! same way as update/update races.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: once `commit()` returns the
//! data is on disk and the file is always in a consistent state, which also
//! means a read snapshot can never observe half of a commit.

use redb::{Database, ReadOnlyTable, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Document bodies: key = (collection, key), value = JSON bytes
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

/// Commit counters: key = (collection, key), value = number of committed writes
const VERSIONS_TABLE: TableDefinition<(&str, &str), u64> = TableDefinition::new("versions");

/// Default bounded retry budget for conflicting transactions
const DEFAULT_TXN_ATTEMPTS: u32 = 5;

/// Linear backoff step between conflicting attempts
const CONFLICT_BACKOFF_MS: u64 = 5;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction conflict: retry budget exhausted")]
    Conflict,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Buffered write declared by a transaction body
enum WriteOp {
    Set {
        collection: String,
        key: String,
        bytes: Vec<u8>,
    },
    Delete {
        collection: String,
        key: String,
    },
}

/// One transaction attempt: snapshot reads + deferred writes
///
/// Reads must precede the writes they depend on; `get` returns committed
/// state only, never the attempt's own buffered writes.
pub struct Txn {
    docs: ReadOnlyTable<(&'static str, &'static str), &'static [u8]>,
    versions: ReadOnlyTable<(&'static str, &'static str), u64>,
    reads: Vec<(String, String, u64)>,
    writes: Vec<WriteOp>,
}

impl Txn {
    fn begin(db: &Database) -> StoreResult<Self> {
        let read_txn = db.begin_read()?;
        Ok(Self {
            docs: read_txn.open_table(DOCUMENTS_TABLE)?,
            versions: read_txn.open_table(VERSIONS_TABLE)?,
            reads: Vec::new(),
            writes: Vec::new(),
        })
    }

    /// Read a document from the attempt's snapshot, recording its version
    pub fn get<D: DeserializeOwned>(
        &mut self,
        collection: &str,
        key: &str,
    ) -> StoreResult<Option<D>> {
        let version = self
            .versions
            .get((collection, key))?
            .map(|guard| guard.value())
            .unwrap_or(0);
        if !self
            .reads
            .iter()
            .any(|(c, k, _)| c == collection && k == key)
        {
            self.reads
                .push((collection.to_string(), key.to_string(), version));
        }
        match self.docs.get((collection, key))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Declare a document write, applied atomically at commit
    pub fn set<D: Serialize>(&mut self, collection: &str, key: &str, doc: &D) -> StoreResult<()> {
        self.writes.push(WriteOp::Set {
            collection: collection.to_string(),
            key: key.to_string(),
            bytes: serde_json::to_vec(doc)?,
        });
        Ok(())
    }

    /// Declare a document deletion, applied atomically at commit
    pub fn delete(&mut self, collection: &str, key: &str) {
        self.writes.push(WriteOp::Delete {
            collection: collection.to_string(),
            key: key.to_string(),
        });
    }

    /// Validate observed versions and apply buffered writes
    ///
    /// Returns `Ok(false)` on a version conflict (caller retries the body).
    fn commit(self, db: &Database) -> StoreResult<bool> {
        if self.writes.is_empty() {
            // Read-only attempt: the snapshot was already consistent
            return Ok(true);
        }

        let write_txn = db.begin_write()?;
        let clean = {
            let mut versions = write_txn.open_table(VERSIONS_TABLE)?;

            let mut clean = true;
            for (collection, key, observed) in &self.reads {
                let current = versions
                    .get((collection.as_str(), key.as_str()))?
                    .map(|guard| guard.value())
                    .unwrap_or(0);
                if current != *observed {
                    clean = false;
                    break;
                }
            }

            if clean {
                let mut docs = write_txn.open_table(DOCUMENTS_TABLE)?;
                for op in &self.writes {
                    let (collection, key) = match op {
                        WriteOp::Set { collection, key, .. }
                        | WriteOp::Delete { collection, key } => {
                            (collection.as_str(), key.as_str())
                        }
                    };
                    match op {
                        WriteOp::Set { bytes, .. } => {
                            docs.insert((collection, key), bytes.as_slice())?;
                        }
                        WriteOp::Delete { .. } => {
                            docs.remove((collection, key))?;
                        }
                    }
                    let next = versions
                        .get((collection, key))?
                        .map(|guard| guard.value())
                        .unwrap_or(0)
                        + 1;
                    versions.insert((collection, key), next)?;
                }
            }
            clean
        };

        if clean {
            write_txn.commit()?;
            Ok(true)
        } else {
            write_txn.abort()?;
            Ok(false)
        }
    }
}

/// Document store backed by redb
#[derive(Clone)]
pub struct LedgerStore {
    db: Arc<Database>,
    txn_attempts: u32,
}

impl LedgerStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Create tables up front so read transactions never see them missing
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let _ = write_txn.open_table(VERSIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            txn_attempts: DEFAULT_TXN_ATTEMPTS,
        })
    }

    /// Override the bounded retry budget (minimum 1)
    pub fn with_txn_attempts(mut self, attempts: u32) -> Self {
        self.txn_attempts = attempts.max(1);
        self
    }

    /// Execute a read-then-write body under optimistic concurrency
    ///
    /// The body may run several times; it must be free of side effects other
    /// than `Txn` reads and writes. An `Err` return aborts the attempt with
    /// nothing committed and is passed through without retry; business-rule
    /// failures take that path. Version conflicts retry up to the budget,
    /// then surface [`StoreError::Conflict`].
    pub fn run_transaction<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnMut(&mut Txn) -> Result<T, E>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut txn = Txn::begin(&self.db).map_err(E::from)?;
            let value = work(&mut txn)?;
            if txn.commit(&self.db).map_err(E::from)? {
                return Ok(value);
            }
            if attempt >= self.txn_attempts {
                tracing::warn!(attempts = attempt, "Transaction retry budget exhausted");
                return Err(E::from(StoreError::Conflict));
            }
            tracing::debug!(attempt, "Transaction conflict, retrying");
            std::thread::sleep(Duration::from_millis(CONFLICT_BACKOFF_MS * attempt as u64));
        }
    }

    /// Read one document outside any transaction
    pub fn read_one<D: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> StoreResult<Option<D>> {
        let read_txn = self.db.begin_read()?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;
        match docs.get((collection, key))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Batched read of several keys from one consistent snapshot
    ///
    /// Missing documents come back as `None` in the matching position.
    pub fn read_many<D: DeserializeOwned>(
        &self,
        collection: &str,
        keys: &[String],
    ) -> StoreResult<Vec<Option<D>>> {
        let read_txn = self.db.begin_read()?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            match docs.get((collection, key.as_str()))? {
                Some(guard) => out.push(Some(serde_json::from_slice(guard.value())?)),
                None => out.push(None),
            }
        }
        Ok(out)
    }

    /// Scan a whole collection, key-ordered
    pub fn scan<D: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<(String, D)>> {
        let read_txn = self.db.begin_read()?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;
        let mut out = Vec::new();
        for item in docs.range((collection, "")..)? {
            let (key_guard, value_guard) = item?;
            let (coll, key) = key_guard.value();
            if coll != collection {
                break;
            }
            out.push((key.to_string(), serde_json::from_slice(value_guard.value())?));
        }
        Ok(out)
    }

    /// Unconditional overwrite, bypassing conflict detection
    ///
    /// Still bumps the version counter so concurrent optimistic transactions
    /// that read the old value will conflict and retry against the new one.
    /// Last writer wins; reserved for explicitly destructive admin paths.
    pub fn put_unchecked<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        doc: &D,
    ) -> StoreResult<()> {
        let bytes = serde_json::to_vec(doc)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut docs = write_txn.open_table(DOCUMENTS_TABLE)?;
            docs.insert((collection, key), bytes.as_slice())?;
            let mut versions = write_txn.open_table(VERSIONS_TABLE)?;
            let next = versions
                .get((collection, key))?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            versions.insert((collection, key), next)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("db", &"<redb::Database>")
            .field("txn_attempts", &self.txn_attempts)
            .finish()
    }
}
