//! Engine facade
//!
//! Wires one shared [`LedgerStore`] into the three service surfaces. All
//! services clone the same store handle; coordination between concurrent
//! callers comes entirely from the store's optimistic transactions, never
//! from in-process locks.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::ledger::OrderLedger;
use crate::notices::NoticeService;
use crate::stats::StatsService;
use crate::store::{LedgerStore, StoreResult};

/// Database file name inside `Config::data_dir`
const DB_FILE: &str = "pantry.redb";

/// Composition point for the order ledger, notice board and admin stats
#[derive(Clone)]
pub struct Engine {
    pub ledger: OrderLedger,
    pub notices: NoticeService,
    pub stats: StatsService,
}

impl Engine {
    /// Open the engine against the configured data directory
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = Path::new(&config.data_dir).join(DB_FILE);
        let store = LedgerStore::open(path)?.with_txn_attempts(config.txn_attempts);
        tracing::info!(
            data_dir = %config.data_dir,
            timezone = %config.timezone,
            "Pantry engine started"
        );
        Ok(Self::with_store(store, config))
    }

    /// Open an in-memory engine (for testing)
    pub fn open_in_memory(config: &Config) -> StoreResult<Self> {
        let store = LedgerStore::open_in_memory()?.with_txn_attempts(config.txn_attempts);
        Ok(Self::with_store(store, config))
    }

    fn with_store(store: LedgerStore, config: &Config) -> Self {
        let store = Arc::new(store);
        Self {
            ledger: OrderLedger::new(store.clone(), config.timezone),
            notices: NoticeService::new(store.clone()),
            stats: StatsService::new(store, config.timezone),
        }
    }
}
