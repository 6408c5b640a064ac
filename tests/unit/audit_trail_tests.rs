//! Audit trail ordering, clearing and actor labels.

use std::sync::Arc;
use std::time::Duration;

use event_booking::audit::writer::AUDIT_INDEX_KEY;
use event_booking::audit::{Actor, AuditEntry, AuditLogger, AuditTrail};
use event_booking::persistence::db;
use event_booking::persistence::kv::{get_json, KeyValueStore, SqliteKvStore};
use event_booking::persistence::locks::KeyLocks;

async fn trail() -> (AuditTrail, Arc<dyn KeyValueStore>) {
    capped_trail(1000).await
}

async fn capped_trail(max_entries: usize) -> (AuditTrail, Arc<dyn KeyValueStore>) {
    let pool = db::connect_memory().await.expect("in-memory db");
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(Arc::new(pool)));
    (
        AuditTrail::new(
            Arc::clone(&store),
            KeyLocks::new(),
            Duration::from_secs(3600),
            max_entries,
        ),
        store,
    )
}

#[test]
fn actor_labels() {
    assert_eq!(Actor::System.to_string(), "system");
    assert_eq!(Actor::Admin.to_string(), "Admin");
    assert_eq!(
        Actor::Customer("ana@example.com".into()).to_string(),
        "ana@example.com"
    );
}

#[test]
fn builder_sets_optional_fields() {
    let entry = AuditEntry::new("confirmed", "Ana friday 10:00")
        .with_appointment("appt-1")
        .with_actor(&Actor::Admin);
    assert_eq!(entry.action, "confirmed");
    assert_eq!(entry.appointment_id.as_deref(), Some("appt-1"));
    assert_eq!(entry.actor.as_deref(), Some("Admin"));
    assert!(!entry.id.is_empty());
}

#[tokio::test]
async fn list_returns_newest_first_with_limit() {
    let (trail, _store) = trail().await;
    for action in ["requested", "confirmed", "cancelled"] {
        trail
            .record(AuditEntry::new(action, "details"))
            .await
            .expect("record");
    }

    let all = trail.list(10).await.expect("list");
    let actions: Vec<&str> = all.iter().map(|entry| entry.action.as_str()).collect();
    assert_eq!(actions, vec!["cancelled", "confirmed", "requested"]);

    let latest = trail.list(1).await.expect("list");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].action, "cancelled");
}

#[tokio::test]
async fn clear_leaves_a_single_entry() {
    let (trail, store) = trail().await;
    for n in 0..4 {
        trail
            .record(AuditEntry::new("requested", format!("booking {n}")))
            .await
            .expect("record");
    }

    let removed = trail.clear(&Actor::Admin).await.expect("clear");
    assert_eq!(removed, 4);

    let remaining = trail.list(10).await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].action, "audit log cleared");
    assert_eq!(remaining[0].details, "removed 4 audit entries");
    assert_eq!(remaining[0].actor.as_deref(), Some("Admin"));

    let audit_keys = store.keys_with_prefix("audit:").await.expect("keys");
    assert_eq!(audit_keys.len(), 2, "one entry plus the index");
    assert!(audit_keys.iter().any(|key| key == AUDIT_INDEX_KEY));
}

#[tokio::test]
async fn concurrent_records_all_reach_the_index() {
    let (trail, _store) = trail().await;
    let mut handles = Vec::new();
    for n in 0..15 {
        let trail = trail.clone();
        handles.push(tokio::spawn(async move {
            trail
                .record(AuditEntry::new("notification sent", format!("#{n}")))
                .await
                .expect("record");
        }));
    }
    for handle in handles {
        handle.await.expect("join");
    }
    assert_eq!(trail.list(100).await.expect("list").len(), 15);
}

#[tokio::test]
async fn index_is_capped_and_oldest_entries_dropped() {
    let (trail, store) = capped_trail(3).await;
    for n in 0..7 {
        trail
            .record(AuditEntry::new("requested", format!("booking {n}")))
            .await
            .expect("record");
    }

    let index: Vec<String> = get_json(store.as_ref(), AUDIT_INDEX_KEY)
        .await
        .expect("read index")
        .expect("index present");
    assert_eq!(index.len(), 3);

    let details: Vec<String> = trail
        .list(10)
        .await
        .expect("list")
        .into_iter()
        .map(|entry| entry.details)
        .collect();
    assert_eq!(details, vec!["booking 6", "booking 5", "booking 4"]);

    let audit_keys = store.keys_with_prefix("audit:").await.expect("keys");
    assert_eq!(audit_keys.len(), 4, "three entries plus the index");
}
