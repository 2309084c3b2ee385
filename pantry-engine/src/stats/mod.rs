//! Admin rollups over the daily aggregates
//!
//! Read-only reporting views. Each call reads from one store snapshot, so a
//! half-committed aggregate is never observable even though these reads run
//! outside any transaction.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::ledger::{DAILY_STATS, DailyAggregate, DailyCounts};
use crate::store::{LedgerStore, StoreResult};
use crate::utils::time;

/// Totals for one calendar date
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DailyTotals {
    /// Business date key (YYYY-MM-DD)
    pub date: String,
    pub tea: u32,
    pub coffee: u32,
    pub juice: u32,
    pub total: u32,
}

impl DailyTotals {
    fn from_counts(date: String, counts: DailyCounts) -> Self {
        Self {
            date,
            tea: counts.tea,
            coffee: counts.coffee,
            juice: counts.juice,
            total: counts.total(),
        }
    }
}

/// Reporting service for admin and public dashboards
#[derive(Clone)]
pub struct StatsService {
    store: Arc<LedgerStore>,
    tz: Tz,
}

impl StatsService {
    pub fn new(store: Arc<LedgerStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Per-day totals for the last `n` days including today, oldest first
    ///
    /// Dates with no aggregate come back zero-filled so charts always get a
    /// full series.
    pub fn last_n_days(&self, n: u32) -> StoreResult<Vec<DailyTotals>> {
        self.last_n_days_ending(time::local_date(Utc::now(), self.tz), n)
    }

    pub(crate) fn last_n_days_ending(
        &self,
        today: NaiveDate,
        n: u32,
    ) -> StoreResult<Vec<DailyTotals>> {
        let keys: Vec<String> = time::last_n_dates(today, n)
            .into_iter()
            .map(time::date_key)
            .collect();
        let aggregates: Vec<Option<DailyAggregate>> = self.store.read_many(DAILY_STATS, &keys)?;

        Ok(keys
            .into_iter()
            .zip(aggregates)
            .map(|(date, agg)| {
                let counts = agg.map(|a| a.counts).unwrap_or_default();
                DailyTotals::from_counts(date, counts)
            })
            .collect())
    }

    /// Today's counters for the public dashboard
    pub fn today_totals(&self) -> StoreResult<DailyCounts> {
        self.totals_for(time::local_date(Utc::now(), self.tz))
    }

    pub(crate) fn totals_for(&self, date: NaiveDate) -> StoreResult<DailyCounts> {
        let agg: Option<DailyAggregate> = self.store.read_one(DAILY_STATS, &time::date_key(date))?;
        Ok(agg.map(|a| a.counts).unwrap_or_default())
    }
}
