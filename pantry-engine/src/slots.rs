//! Ordering time slots
//!
//! Two daily windows accept beverage orders: Morning (midnight until
//! 10:30 inclusive) and Evening (15:00 until 17:30 inclusive). Everything
//! else is closed. Both boundaries are minute-of-day comparisons in the
//! business timezone, so the same instant always lands in the same slot
//! regardless of which code path asks.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils::time;

/// Morning window closes at 10:30 (inclusive)
const MORNING_END_MINUTES: u32 = 10 * 60 + 30;

/// Evening window: 15:00 - 17:30 (inclusive)
const EVENING_START_MINUTES: u32 = 15 * 60;
const EVENING_END_MINUTES: u32 = 17 * 60 + 30;

/// Named daily ordering window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    Morning,
    Evening,
}

impl std::fmt::Display for SlotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotName::Morning => write!(f, "morning"),
            SlotName::Evening => write!(f, "evening"),
        }
    }
}

/// Result of classifying an instant against the ordering windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// Inside an active window; `closes_at` is the window end (Unix millis)
    Open { slot: SlotName, closes_at: i64 },
    /// Between windows; `opens_at` is when ordering resumes (Unix millis)
    Closed { next_slot: SlotName, opens_at: i64 },
}

impl SlotStatus {
    /// Minutes from `now_millis` until the closed window reopens
    ///
    /// Returns `None` when the status is `Open`.
    pub fn minutes_until_open(&self, now_millis: i64) -> Option<i64> {
        match self {
            SlotStatus::Open { .. } => None,
            SlotStatus::Closed { opens_at, .. } => Some((opens_at - now_millis).max(0) / 60_000),
        }
    }
}

/// Which slot a given minute-of-day falls in, if any
///
/// Single source of truth for the boundaries: both [`classify`] and
/// [`belongs_to_slot`] go through here.
fn slot_of_minutes(minutes: u32) -> Option<SlotName> {
    if minutes <= MORNING_END_MINUTES {
        Some(SlotName::Morning)
    } else if (EVENING_START_MINUTES..=EVENING_END_MINUTES).contains(&minutes) {
        Some(SlotName::Evening)
    } else {
        None
    }
}

/// Classify an instant as inside an ordering window or between windows
///
/// Pure and total: always returns a value. When closed, computes the next
/// opening with day wrap-around (after Evening closes, the Morning window
/// of the following day opens at midnight).
pub fn classify(instant: DateTime<Utc>, tz: Tz) -> SlotStatus {
    let local = instant.with_timezone(&tz);
    let minutes = local.hour() * 60 + local.minute();
    let today = local.date_naive();

    match slot_of_minutes(minutes) {
        Some(SlotName::Morning) => SlotStatus::Open {
            slot: SlotName::Morning,
            closes_at: time::date_hm_to_millis(today, 10, 30, tz),
        },
        Some(SlotName::Evening) => SlotStatus::Open {
            slot: SlotName::Evening,
            closes_at: time::date_hm_to_millis(today, 17, 30, tz),
        },
        None if minutes < EVENING_START_MINUTES => SlotStatus::Closed {
            next_slot: SlotName::Evening,
            opens_at: time::date_hm_to_millis(today, 15, 0, tz),
        },
        None => {
            // Past Evening close: Morning reopens at the next midnight
            let tomorrow = today.succ_opt().unwrap_or(today);
            SlotStatus::Closed {
                next_slot: SlotName::Morning,
                opens_at: time::day_start_millis(tomorrow, tz),
            }
        }
    }
}

/// Re-derive whether an already recorded timestamp falls inside `slot`
///
/// Used by the duplicate check to decide if a stored order stamp belongs to
/// the window currently being ordered in. Timestamps outside chrono's
/// representable range count as belonging to no slot.
pub fn belongs_to_slot(timestamp_millis: i64, slot: SlotName, tz: Tz) -> bool {
    let Some(local) = time::millis_to_local(timestamp_millis, tz) else {
        return false;
    };
    let minutes = local.hour() * 60 + local.minute();
    slot_of_minutes(minutes) == Some(slot)
}
