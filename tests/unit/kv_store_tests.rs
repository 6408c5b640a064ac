//! `SqliteKvStore` behaviour on an in-memory database.

use std::sync::Arc;
use std::time::Duration;

use event_booking::persistence::db;
use event_booking::persistence::kv::{get_json, put_json, KeyValueStore, SqliteKvStore};

async fn store() -> SqliteKvStore {
    let pool = db::connect_memory().await.expect("in-memory db");
    SqliteKvStore::new(Arc::new(pool))
}

#[tokio::test]
async fn put_get_delete_round() {
    let store = store().await;

    assert_eq!(store.get("settings").await.expect("get"), None);
    store.put("settings", "{}", None).await.expect("put");
    assert_eq!(store.get("settings").await.expect("get").as_deref(), Some("{}"));

    store.put("settings", "{\"a\":1}", None).await.expect("overwrite");
    assert_eq!(
        store.get("settings").await.expect("get").as_deref(),
        Some("{\"a\":1}")
    );

    store.delete("settings").await.expect("delete");
    store.delete("settings").await.expect("deleting twice is fine");
    assert_eq!(store.get("settings").await.expect("get"), None);
}

#[tokio::test]
async fn expired_entries_read_as_absent_and_purge() {
    let store = store().await;

    store
        .put("ratelimit:1.2.3.4", "x", Some(Duration::from_millis(1)))
        .await
        .expect("put");
    store.put("settings", "y", None).await.expect("put");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(store.get("ratelimit:1.2.3.4").await.expect("get"), None);
    assert!(store
        .keys_with_prefix("ratelimit:")
        .await
        .expect("keys")
        .is_empty());

    assert_eq!(store.purge_expired().await.expect("purge"), 1);
    assert_eq!(store.get("settings").await.expect("get").as_deref(), Some("y"));
}

#[tokio::test]
async fn prefix_listing_is_literal() {
    let store = store().await;
    for key in ["slot:friday:10:00:2026-06-12", "slot:saturday:11:30:2026-06-13", "slots_x", "s%ot:1"] {
        store.put(key, "[]", None).await.expect("put");
    }

    let keys = store.keys_with_prefix("slot:").await.expect("keys");
    assert_eq!(
        keys,
        vec![
            "slot:friday:10:00:2026-06-12".to_owned(),
            "slot:saturday:11:30:2026-06-13".to_owned()
        ]
    );
    let wildcard = store.keys_with_prefix("s%").await.expect("keys");
    assert_eq!(wildcard, vec!["s%ot:1".to_owned()]);
}

#[tokio::test]
async fn json_helpers_round_trip_and_report_corruption() {
    let store = store().await;
    put_json(&store, "ids", &vec!["a", "b"], None)
        .await
        .expect("put json");
    let ids: Option<Vec<String>> = get_json(&store, "ids").await.expect("get json");
    assert_eq!(ids, Some(vec!["a".to_owned(), "b".to_owned()]));

    store.put("broken", "{not json", None).await.expect("put");
    assert!(get_json::<Vec<String>>(&store, "broken").await.is_err());
}

#[tokio::test]
async fn file_database_persists_across_connections() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("booking.db");

    {
        let pool = db::connect(&path).await.expect("file db");
        let store = SqliteKvStore::new(Arc::new(pool.clone()));
        store.put("settings", "kept", None).await.expect("put");
        pool.close().await;
    }

    let pool = db::connect(&path).await.expect("reopen");
    let store = SqliteKvStore::new(Arc::new(pool));
    assert_eq!(store.get("settings").await.expect("get").as_deref(), Some("kept"));
}
