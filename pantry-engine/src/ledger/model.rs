//! Order ledger models

use serde::{Deserialize, Serialize};

/// Beverage kinds offered by the pantry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Beverage {
    Tea,
    Coffee,
    Juice,
}

impl Beverage {
    pub const ALL: [Beverage; 3] = [Beverage::Tea, Beverage::Coffee, Beverage::Juice];

    /// Capitalized label for user-facing summaries
    pub fn label(&self) -> &'static str {
        match self {
            Beverage::Tea => "Tea",
            Beverage::Coffee => "Coffee",
            Beverage::Juice => "Juice",
        }
    }
}

impl std::fmt::Display for Beverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Beverage::Tea => write!(f, "tea"),
            Beverage::Coffee => write!(f, "coffee"),
            Beverage::Juice => write!(f, "juice"),
        }
    }
}

/// Per-kind counters for one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    #[serde(default)]
    pub tea: u32,

    #[serde(default)]
    pub coffee: u32,

    #[serde(default)]
    pub juice: u32,
}

impl DailyCounts {
    pub fn get(&self, kind: Beverage) -> u32 {
        match kind {
            Beverage::Tea => self.tea,
            Beverage::Coffee => self.coffee,
            Beverage::Juice => self.juice,
        }
    }

    pub fn total(&self) -> u32 {
        self.tea + self.coffee + self.juice
    }
}

/// Lightweight order stamp embedded in the daily aggregate
///
/// Only what the slot duplicate check needs; full order data lives in the
/// normalized `orders` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStamp {
    pub user_id: String,
    pub kind: Beverage,

    /// Unix millis
    pub timestamp: i64,
}

/// Per-date aggregate document (key = `YYYY-MM-DD` in the business timezone)
///
/// Created lazily on the first order of the day; counters and stamps only
/// change together inside one committed transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyAggregate {
    #[serde(flatten)]
    pub counts: DailyCounts,

    /// Stamps backing the per-slot duplicate check
    #[serde(default)]
    pub orders: Vec<OrderStamp>,

    /// Unix millis of the last committed mutation
    #[serde(default)]
    pub last_updated: i64,
}

impl DailyAggregate {
    pub fn bump(&mut self, kind: Beverage) {
        match kind {
            Beverage::Tea => self.counts.tea += 1,
            Beverage::Coffee => self.counts.coffee += 1,
            Beverage::Juice => self.counts.juice += 1,
        }
    }
}

/// Normalized order record (key = generated id, write-once)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub kind: Beverage,

    /// Unix millis
    pub timestamp: i64,

    /// Business date key (YYYY-MM-DD), denormalized for date-scoped queries
    pub date: String,
}

/// Place-order request from an already verified caller
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub kind: Beverage,
}

/// Successful order placement
#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub record_id: String,
    pub slot: crate::slots::SlotName,

    /// Counters after this order committed
    pub counts: DailyCounts,
}

/// One page of a user's order history
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderRecord>,
    pub total: usize,
    pub has_more: bool,
}

/// Aggregate per-user stats
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_orders: u32,
    pub counts: DailyCounts,

    /// Capitalized kind with the most orders, "None" for a fresh user
    pub favorite: String,
}
