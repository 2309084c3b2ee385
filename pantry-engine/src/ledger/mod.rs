//! Order Ledger — at most one order per user per slot per day
//!
//! # Placement flow
//!
//! ```text
//! place_order(input)
//!     ├─ 1. classify(now): closed window fails before any I/O
//!     ├─ 2. run_transaction:
//!     │      ├─ read today's DailyAggregate (lazy-created)
//!     │      ├─ duplicate check: stamp with same user in the current slot
//!     │      ├─ bump counter + append stamp
//!     │      └─ create normalized OrderRecord (same commit)
//!     └─ 3. conflict → bounded retry → TransientConflict
//! ```
//!
//! The aggregate keeps counters and stamps in one document so the duplicate
//! check and the dashboard counters can never drift apart; the normalized
//! `orders` collection serves user-scoped history without scanning stamps.

mod error;
mod model;

pub use error::{LedgerError, LedgerResult};
pub use model::{
    Beverage, DailyAggregate, DailyCounts, OrderInput, OrderPage, OrderPlaced, OrderRecord,
    OrderStamp, UserStats,
};

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::slots::{self, SlotStatus};
use crate::store::LedgerStore;
use crate::utils::time;

/// Per-date aggregate documents, shared with the stats rollups
pub(crate) const DAILY_STATS: &str = "daily_stats";

/// Normalized order records
pub(crate) const ORDERS: &str = "orders";

/// Order ledger service
#[derive(Clone)]
pub struct OrderLedger {
    store: Arc<LedgerStore>,
    tz: Tz,
}

impl OrderLedger {
    pub fn new(store: Arc<LedgerStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Place an order in the currently open slot
    pub fn place_order(&self, input: OrderInput) -> LedgerResult<OrderPlaced> {
        self.place_order_at(Utc::now(), input)
    }

    /// Place an order as of a given instant (separated for testability)
    pub(crate) fn place_order_at(
        &self,
        now: DateTime<Utc>,
        input: OrderInput,
    ) -> LedgerResult<OrderPlaced> {
        let slot = match slots::classify(now, self.tz) {
            SlotStatus::Open { slot, .. } => slot,
            SlotStatus::Closed { next_slot, opens_at } => {
                return Err(LedgerError::OutsideOrderingWindow { next_slot, opens_at });
            }
        };

        let date = time::date_key(time::local_date(now, self.tz));
        let now_ms = now.timestamp_millis();
        let record_id = uuid::Uuid::new_v4().to_string();

        let placed = self.store.run_transaction(|txn| {
            let mut agg: DailyAggregate = txn.get(DAILY_STATS, &date)?.unwrap_or_default();

            let duplicate = agg.orders.iter().any(|stamp| {
                stamp.user_id == input.user_id
                    && slots::belongs_to_slot(stamp.timestamp, slot, self.tz)
            });
            if duplicate {
                return Err(LedgerError::AlreadyOrderedThisSlot(slot));
            }

            agg.bump(input.kind);
            agg.orders.push(OrderStamp {
                user_id: input.user_id.clone(),
                kind: input.kind,
                timestamp: now_ms,
            });
            agg.last_updated = now_ms;
            txn.set(DAILY_STATS, &date, &agg)?;

            let record = OrderRecord {
                id: record_id.clone(),
                user_id: input.user_id.clone(),
                email: input.email.clone(),
                user_name: input
                    .display_name
                    .clone()
                    .unwrap_or_else(|| input.email.clone()),
                kind: input.kind,
                timestamp: now_ms,
                date: date.clone(),
            };
            txn.set(ORDERS, &record.id, &record)?;

            Ok(OrderPlaced {
                record_id: record.id,
                slot,
                counts: agg.counts,
            })
        })?;

        tracing::info!(
            user_id = %input.user_id,
            kind = %input.kind,
            slot = %placed.slot,
            "Order placed"
        );
        Ok(placed)
    }

    /// The caller's orders placed today, newest first
    pub fn my_orders_today(&self, user_id: &str) -> LedgerResult<Vec<OrderRecord>> {
        self.my_orders_since(user_id, Utc::now())
    }

    pub(crate) fn my_orders_since(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<OrderRecord>> {
        let day_start = time::day_start_millis(time::local_date(now, self.tz), self.tz);
        let mut orders: Vec<OrderRecord> = self
            .store
            .scan::<OrderRecord>(ORDERS)?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| record.user_id == user_id && record.timestamp >= day_start)
            .collect();
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(orders)
    }

    /// Full order history for a user, newest first, with optional kind filter
    pub fn order_history(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
        kind: Option<Beverage>,
    ) -> LedgerResult<OrderPage> {
        let mut orders: Vec<OrderRecord> = self
            .store
            .scan::<OrderRecord>(ORDERS)?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| {
                record.user_id == user_id && kind.is_none_or(|k| record.kind == k)
            })
            .collect();
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = orders.len();
        let has_more = total > offset + limit;
        let orders = orders.into_iter().skip(offset).take(limit).collect();
        Ok(OrderPage {
            orders,
            total,
            has_more,
        })
    }

    /// Aggregate stats over a user's whole history
    pub fn user_stats(&self, user_id: &str) -> LedgerResult<UserStats> {
        let mut counts = DailyCounts::default();
        for (_, record) in self.store.scan::<OrderRecord>(ORDERS)? {
            if record.user_id == user_id {
                match record.kind {
                    Beverage::Tea => counts.tea += 1,
                    Beverage::Coffee => counts.coffee += 1,
                    Beverage::Juice => counts.juice += 1,
                }
            }
        }

        // First kind wins ties, in menu order
        let mut favorite = "None";
        let mut max_count = 0;
        for kind in Beverage::ALL {
            if counts.get(kind) > max_count {
                max_count = counts.get(kind);
                favorite = kind.label();
            }
        }

        Ok(UserStats {
            total_orders: counts.total(),
            counts,
            favorite: favorite.to_string(),
        })
    }

    /// Hard-reset today's aggregate to zero counters and no stamps
    ///
    /// Destructive and deliberately non-transactional: an order committing
    /// at the same instant is wiped with everything else (last writer wins).
    /// The overwrite still bumps the document version, so an in-flight
    /// `place_order` that read pre-reset state retries against the zeroed
    /// aggregate rather than resurrecting the old counters.
    pub fn reset_today(&self) -> LedgerResult<DailyCounts> {
        self.reset_day(Utc::now())
    }

    pub(crate) fn reset_day(&self, now: DateTime<Utc>) -> LedgerResult<DailyCounts> {
        let date = time::date_key(time::local_date(now, self.tz));
        let agg = DailyAggregate {
            last_updated: time::now_millis(),
            ..Default::default()
        };
        self.store.put_unchecked(DAILY_STATS, &date, &agg)?;
        tracing::warn!(date = %date, "Daily aggregate reset to zero");
        Ok(agg.counts)
    }
}
