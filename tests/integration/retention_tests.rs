//! Background purge of expired store rows.

use std::time::Duration;

use event_booking::persistence::retention::spawn_retention_task;
use tokio_util::sync::CancellationToken;

use super::test_helpers::memory_store;

#[tokio::test]
async fn retention_task_purges_expired_rows_and_stops_on_cancel() {
    let store = memory_store().await;
    store
        .put("ratelimit:198.51.100.7", "{}", Some(Duration::from_millis(1)))
        .await
        .expect("short-lived put");
    store
        .put("settings", "{}", None)
        .await
        .expect("permanent put");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let ct = CancellationToken::new();
    let handle = spawn_retention_task(store.clone(), ct.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    ct.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("task stops after cancel")
        .expect("task did not panic");

    assert_eq!(store.purge_expired().await.expect("purge"), 0, "already purged");
    assert_eq!(store.get("settings").await.expect("get").as_deref(), Some("{}"));
    assert!(store
        .get("ratelimit:198.51.100.7")
        .await
        .expect("get")
        .is_none());
}
