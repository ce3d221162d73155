use std::collections::BTreeMap;

use alpha_metrics::storage::{KvStore, KEY_STABLE_TOLERANCE, KEY_TOTAL_RECORDS};

#[test]
fn values_round_trip_as_json() {
    let store = KvStore::open_in_memory().unwrap();
    assert_eq!(store.get::<f64>(KEY_STABLE_TOLERANCE), None);

    store.set(KEY_STABLE_TOLERANCE, &0.75);
    assert_eq!(store.get::<f64>(KEY_STABLE_TOLERANCE), Some(0.75));
    assert_eq!(
        store.try_get_raw(KEY_STABLE_TOLERANCE).unwrap().as_deref(),
        Some("0.75")
    );

    // Upsert replaces the previous value.
    store.set(KEY_STABLE_TOLERANCE, &2.0);
    assert_eq!(store.get::<f64>(KEY_STABLE_TOLERANCE), Some(2.0));

    store.remove(KEY_STABLE_TOLERANCE);
    assert_eq!(store.get::<f64>(KEY_STABLE_TOLERANCE), None);
}

#[test]
fn file_store_survives_reopen() {
    let dir = std::env::temp_dir().join(format!("alpha-kv-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("nested").join("kv.sqlite");

    let mut records = BTreeMap::new();
    records.insert("ABC".to_string(), 1.5_f64);
    {
        let store = KvStore::open(&path).unwrap();
        store.set(KEY_TOTAL_RECORDS, &records);
    }
    let store = KvStore::open(&path).unwrap();
    assert_eq!(
        store.get::<BTreeMap<String, f64>>(KEY_TOTAL_RECORDS),
        Some(records)
    );
    let _ = std::fs::remove_dir_all(&dir);
}
