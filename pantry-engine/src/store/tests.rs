use super::*;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Doc {
    value: u32,
}

#[test]
fn test_read_your_committed_writes() {
    let store = LedgerStore::open_in_memory().unwrap();

    store
        .run_transaction::<_, StoreError, _>(|txn| {
            txn.set("things", "a", &Doc { value: 1 })?;
            Ok(())
        })
        .unwrap();

    let doc: Option<Doc> = store.read_one("things", "a").unwrap();
    assert_eq!(doc, Some(Doc { value: 1 }));
}

#[test]
fn test_multi_document_commit_is_atomic() {
    let store = LedgerStore::open_in_memory().unwrap();

    store
        .run_transaction::<_, StoreError, _>(|txn| {
            txn.set("a", "k", &Doc { value: 1 })?;
            txn.set("b", "k", &Doc { value: 2 })?;
            Ok(())
        })
        .unwrap();

    assert_eq!(store.read_one::<Doc>("a", "k").unwrap().unwrap().value, 1);
    assert_eq!(store.read_one::<Doc>("b", "k").unwrap().unwrap().value, 2);
}

#[test]
fn test_business_error_aborts_without_writes() {
    let store = LedgerStore::open_in_memory().unwrap();

    let result: Result<(), StoreError> = store.run_transaction(|txn| {
        txn.set("things", "a", &Doc { value: 7 })?;
        Err(StoreError::Conflict) // stand-in for a business-rule failure
    });

    assert!(result.is_err());
    assert!(store.read_one::<Doc>("things", "a").unwrap().is_none());
}

#[test]
fn test_conflict_detected_and_retried() {
    let store = LedgerStore::open_in_memory().unwrap();
    store.put_unchecked("counters", "c", &Doc { value: 0 }).unwrap();

    // First attempt races with an external writer; the retry must observe
    // the bumped value and still commit exactly one increment on top of it.
    let mut attempts = 0;
    let result: Result<u32, StoreError> = store.run_transaction(|txn| {
        attempts += 1;
        let doc: Doc = txn.get("counters", "c")?.unwrap_or(Doc { value: 0 });
        if attempts == 1 {
            // Concurrent commit after our snapshot was taken
            store.put_unchecked("counters", "c", &Doc { value: 100 }).unwrap();
        }
        let next = Doc { value: doc.value + 1 };
        txn.set("counters", "c", &next)?;
        Ok(next.value)
    });

    assert_eq!(attempts, 2);
    assert_eq!(result.unwrap(), 101);
    assert_eq!(store.read_one::<Doc>("counters", "c").unwrap().unwrap().value, 101);
}

#[test]
fn test_conflict_budget_exhaustion_surfaces() {
    let store = LedgerStore::open_in_memory().unwrap().with_txn_attempts(3);
    store.put_unchecked("counters", "c", &Doc { value: 0 }).unwrap();

    let mut attempts = 0;
    let result: Result<(), StoreError> = store.run_transaction(|txn| {
        attempts += 1;
        let doc: Doc = txn.get("counters", "c")?.unwrap_or(Doc { value: 0 });
        // Every attempt loses the race
        store.put_unchecked("counters", "c", &Doc { value: doc.value + 10 }).unwrap();
        txn.set("counters", "c", &Doc { value: doc.value + 1 })?;
        Ok(())
    });

    assert_eq!(attempts, 3);
    assert!(matches!(result, Err(StoreError::Conflict)));
}

#[test]
fn test_create_create_race_conflicts() {
    // An absent document reads as version 0, so two racing creators cannot
    // both commit blindly.
    let store = LedgerStore::open_in_memory().unwrap();

    let mut attempts = 0;
    let result: Result<u32, StoreError> = store.run_transaction(|txn| {
        attempts += 1;
        let existing: Option<Doc> = txn.get("things", "fresh")?;
        if attempts == 1 {
            assert!(existing.is_none());
            store.put_unchecked("things", "fresh", &Doc { value: 50 }).unwrap();
        }
        match existing {
            Some(doc) => Ok(doc.value),
            None => {
                txn.set("things", "fresh", &Doc { value: 1 })?;
                Ok(1)
            }
        }
    });

    // Retry observed the winner and backed off to a read
    assert_eq!(attempts, 2);
    assert_eq!(result.unwrap(), 50);
}

#[test]
fn test_delete_is_transactional() {
    let store = LedgerStore::open_in_memory().unwrap();
    store.put_unchecked("things", "a", &Doc { value: 1 }).unwrap();

    store
        .run_transaction::<_, StoreError, _>(|txn| {
            let _: Option<Doc> = txn.get("things", "a")?;
            txn.delete("things", "a");
            Ok(())
        })
        .unwrap();

    assert!(store.read_one::<Doc>("things", "a").unwrap().is_none());
}

#[test]
fn test_scan_is_scoped_to_collection() {
    let store = LedgerStore::open_in_memory().unwrap();
    store.put_unchecked("aaa", "1", &Doc { value: 1 }).unwrap();
    store.put_unchecked("aab", "2", &Doc { value: 2 }).unwrap();

    let docs: Vec<(String, Doc)> = store.scan("aaa").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].0, "1");
}

#[test]
fn test_read_many_preserves_positions() {
    let store = LedgerStore::open_in_memory().unwrap();
    store.put_unchecked("days", "2026-01-01", &Doc { value: 3 }).unwrap();

    let keys = vec![
        "2026-01-01".to_string(),
        "2026-01-02".to_string(),
        "2026-01-03".to_string(),
    ];
    let docs: Vec<Option<Doc>> = store.read_many("days", &keys).unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs[0].is_some());
    assert!(docs[1].is_none());
    assert!(docs[2].is_none());
}

#[test]
fn test_file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.redb");

    {
        let store = LedgerStore::open(&path).unwrap();
        store.put_unchecked("things", "a", &Doc { value: 9 }).unwrap();
    }

    let store = LedgerStore::open(&path).unwrap();
    assert_eq!(store.read_one::<Doc>("things", "a").unwrap().unwrap().value, 9);
}
