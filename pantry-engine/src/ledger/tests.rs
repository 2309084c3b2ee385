use super::*;
use crate::slots::SlotName;

const TZ: Tz = chrono_tz::Europe::Madrid;

fn test_ledger() -> OrderLedger {
    let store = LedgerStore::open_in_memory().unwrap();
    OrderLedger::new(Arc::new(store), TZ)
}

/// 2026-03-`day` at the given local time
fn on(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    use chrono::TimeZone;
    TZ.with_ymd_and_hms(2026, 3, day, hour, min, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    on(10, hour, min)
}

fn input(user: &str, kind: Beverage) -> OrderInput {
    OrderInput {
        user_id: user.to_string(),
        email: format!("{user}@example.com"),
        display_name: Some(format!("User {user}")),
        kind,
    }
}

fn aggregate_for(ledger: &OrderLedger, now: DateTime<Utc>) -> Option<DailyAggregate> {
    let date = time::date_key(time::local_date(now, TZ));
    ledger.store.read_one(DAILY_STATS, &date).unwrap()
}

#[test]
fn test_place_order_morning_succeeds() {
    let ledger = test_ledger();

    let placed = ledger.place_order_at(at(9, 0), input("u1", Beverage::Tea)).unwrap();
    assert_eq!(placed.slot, SlotName::Morning);
    assert_eq!(placed.counts.tea, 1);
    assert_eq!(placed.counts.coffee, 0);

    let orders = ledger.my_orders_since("u1", at(9, 0)).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, Beverage::Tea);
    assert_eq!(orders[0].user_name, "User u1");
}

#[test]
fn test_second_order_same_slot_rejected() {
    let ledger = test_ledger();

    ledger.place_order_at(at(9, 0), input("u1", Beverage::Tea)).unwrap();
    let err = ledger
        .place_order_at(at(9, 5), input("u1", Beverage::Coffee))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyOrderedThisSlot(SlotName::Morning)));

    // The rejected attempt left nothing behind
    let agg = aggregate_for(&ledger, at(9, 5)).unwrap();
    assert_eq!(agg.counts.coffee, 0);
    assert_eq!(agg.counts.tea, 1);
    assert_eq!(ledger.my_orders_since("u1", at(9, 5)).unwrap().len(), 1);
}

#[test]
fn test_outside_window_no_side_effects() {
    let ledger = test_ledger();

    let err = ledger
        .place_order_at(at(12, 0), input("u1", Beverage::Tea))
        .unwrap_err();
    match err {
        LedgerError::OutsideOrderingWindow { next_slot, .. } => {
            assert_eq!(next_slot, SlotName::Evening);
        }
        other => panic!("expected OutsideOrderingWindow, got {:?}", other),
    }

    // No transaction ran at all
    assert!(aggregate_for(&ledger, at(12, 0)).is_none());
    assert!(ledger.my_orders_since("u1", at(12, 0)).unwrap().is_empty());
}

#[test]
fn test_same_user_morning_and_evening_allowed() {
    let ledger = test_ledger();

    ledger.place_order_at(at(9, 0), input("u1", Beverage::Tea)).unwrap();
    let placed = ledger.place_order_at(at(15, 30), input("u1", Beverage::Tea)).unwrap();
    assert_eq!(placed.slot, SlotName::Evening);
    assert_eq!(placed.counts.tea, 2);
    assert_eq!(ledger.my_orders_since("u1", at(15, 30)).unwrap().len(), 2);
}

#[test]
fn test_same_user_next_day_allowed() {
    let ledger = test_ledger();

    ledger.place_order_at(on(10, 9, 0), input("u1", Beverage::Juice)).unwrap();
    let placed = ledger.place_order_at(on(11, 9, 0), input("u1", Beverage::Juice)).unwrap();
    // Fresh aggregate for the new date
    assert_eq!(placed.counts.juice, 1);
}

#[test]
fn test_aggregate_created_lazily_with_single_count() {
    let ledger = test_ledger();

    ledger.place_order_at(at(9, 0), input("u1", Beverage::Coffee)).unwrap();
    let agg = aggregate_for(&ledger, at(9, 0)).unwrap();
    assert_eq!(agg.counts.coffee, 1);
    assert_eq!(agg.counts.tea, 0);
    assert_eq!(agg.counts.juice, 0);
    assert_eq!(agg.orders.len(), 1);
    assert!(agg.last_updated > 0);
}

#[test]
fn test_counters_match_stamps_and_records() {
    let ledger = test_ledger();

    ledger.place_order_at(at(9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(at(9, 1), input("u2", Beverage::Tea)).unwrap();
    ledger.place_order_at(at(9, 2), input("u3", Beverage::Coffee)).unwrap();
    ledger.place_order_at(at(15, 10), input("u1", Beverage::Juice)).unwrap();

    let agg = aggregate_for(&ledger, at(16, 0)).unwrap();
    for kind in Beverage::ALL {
        let stamps = agg.orders.iter().filter(|s| s.kind == kind).count() as u32;
        assert_eq!(agg.counts.get(kind), stamps, "counter vs stamps for {kind}");
    }

    let records: Vec<(String, OrderRecord)> = ledger.store.scan(ORDERS).unwrap();
    assert_eq!(records.len() as u32, agg.counts.total());
}

#[test]
fn test_concurrent_same_user_single_winner() {
    let ledger = test_ledger();
    let now = at(9, 0);

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let ledger = ledger.clone();
            std::thread::spawn(move || ledger.place_order_at(now, input("u1", Beverage::Tea)))
        })
        .collect();

    let mut won = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => won += 1,
            Err(LedgerError::AlreadyOrderedThisSlot(_)) => duplicates += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(duplicates, 49);
    let agg = aggregate_for(&ledger, now).unwrap();
    assert_eq!(agg.counts.tea, 1);
    assert_eq!(agg.orders.len(), 1);
    assert_eq!(ledger.my_orders_since("u1", now).unwrap().len(), 1);
}

#[test]
fn test_concurrent_distinct_users_all_win() {
    // Every conflict corresponds to another user's commit, so a budget
    // above the thread count guarantees all 20 eventually land.
    let store = LedgerStore::open_in_memory().unwrap().with_txn_attempts(50);
    let ledger = OrderLedger::new(Arc::new(store), TZ);
    let now = at(9, 0);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let ledger = ledger.clone();
            std::thread::spawn(move || {
                ledger.place_order_at(now, input(&format!("u{i}"), Beverage::Tea))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let agg = aggregate_for(&ledger, now).unwrap();
    assert_eq!(agg.counts.tea, 20);
    assert_eq!(agg.orders.len(), 20);
}

#[test]
fn test_reset_today_wipes_counters_and_stamps() {
    let ledger = test_ledger();
    let now = at(9, 0);

    ledger.place_order_at(now, input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(now, input("u2", Beverage::Coffee)).unwrap();

    let counts = ledger.reset_day(now).unwrap();
    assert_eq!(counts.total(), 0);

    let agg = aggregate_for(&ledger, now).unwrap();
    assert_eq!(agg.counts.total(), 0);
    assert!(agg.orders.is_empty());

    // The duplicate-check state is gone with the stamps
    let placed = ledger.place_order_at(at(9, 30), input("u1", Beverage::Tea)).unwrap();
    assert_eq!(placed.counts.tea, 1);
}

#[test]
fn test_my_orders_excludes_other_days_and_users() {
    let ledger = test_ledger();

    ledger.place_order_at(on(9, 9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(on(10, 9, 0), input("u1", Beverage::Coffee)).unwrap();
    ledger.place_order_at(on(10, 9, 0), input("u2", Beverage::Juice)).unwrap();

    let orders = ledger.my_orders_since("u1", on(10, 12, 0)).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, Beverage::Coffee);
}

#[test]
fn test_order_history_pagination_and_filter() {
    let ledger = test_ledger();

    ledger.place_order_at(on(9, 9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(on(9, 15, 30), input("u1", Beverage::Coffee)).unwrap();
    ledger.place_order_at(on(10, 9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(on(10, 15, 30), input("u1", Beverage::Juice)).unwrap();

    let page = ledger.order_history("u1", 2, 0, None).unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.orders.len(), 2);
    assert!(page.has_more);
    // Newest first
    assert_eq!(page.orders[0].kind, Beverage::Juice);

    let rest = ledger.order_history("u1", 2, 2, None).unwrap();
    assert_eq!(rest.orders.len(), 2);
    assert!(!rest.has_more);

    let teas = ledger.order_history("u1", 10, 0, Some(Beverage::Tea)).unwrap();
    assert_eq!(teas.total, 2);
    assert!(teas.orders.iter().all(|o| o.kind == Beverage::Tea));
}

#[test]
fn test_user_stats_favorite_and_totals() {
    let ledger = test_ledger();

    ledger.place_order_at(on(9, 9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(on(10, 9, 0), input("u1", Beverage::Tea)).unwrap();
    ledger.place_order_at(on(10, 15, 30), input("u1", Beverage::Coffee)).unwrap();

    let stats = ledger.user_stats("u1").unwrap();
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.counts.tea, 2);
    assert_eq!(stats.counts.coffee, 1);
    assert_eq!(stats.favorite, "Tea");
}

#[test]
fn test_user_stats_fresh_user() {
    let ledger = test_ledger();
    let stats = ledger.user_stats("nobody").unwrap();
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.favorite, "None");
}

#[test]
fn test_display_name_falls_back_to_email() {
    let ledger = test_ledger();
    let mut req = input("u1", Beverage::Tea);
    req.display_name = None;
    ledger.place_order_at(at(9, 0), req).unwrap();

    let orders = ledger.my_orders_since("u1", at(9, 0)).unwrap();
    assert_eq!(orders[0].user_name, "u1@example.com");
}

#[test]
fn test_conflict_maps_to_transient() {
    let err = LedgerError::from(crate::store::StoreError::Conflict);
    assert!(matches!(err, LedgerError::TransientConflict));
}
