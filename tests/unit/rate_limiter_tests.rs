//! Fixed-window rate limiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use event_booking::models::settings::RateLimitSettings;
use event_booking::persistence::db;
use event_booking::persistence::kv::{get_json, KeyValueStore, SqliteKvStore};
use event_booking::persistence::locks::KeyLocks;
use event_booking::ratelimit::{RateDecision, RateLimitEntry, RateLimiter};
use event_booking::{AppError, Result};

const LIMITS: RateLimitSettings = RateLimitSettings {
    max_requests: 3,
    window_seconds: 60,
};

async fn limiter() -> (RateLimiter, Arc<dyn KeyValueStore>) {
    let pool = db::connect_memory().await.expect("in-memory db");
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(Arc::new(pool)));
    (RateLimiter::new(Arc::clone(&store), KeyLocks::new()), store)
}

/// Store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(AppError::Db("store offline".into()))
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Err(AppError::Db("store offline".into()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(AppError::Db("store offline".into()))
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>> {
        Err(AppError::Db("store offline".into()))
    }

    async fn purge_expired(&self) -> Result<u64> {
        Err(AppError::Db("store offline".into()))
    }
}

#[tokio::test]
async fn allows_max_requests_then_denies() {
    let (limiter, _store) = limiter().await;
    let t0 = Utc::now();

    for expected_remaining in [2, 1, 0] {
        assert_eq!(
            limiter.check_at("198.51.100.7", &LIMITS, t0).await,
            RateDecision::Allowed {
                remaining: expected_remaining
            }
        );
    }
    assert_eq!(
        limiter
            .check_at("198.51.100.7", &LIMITS, t0 + chrono::Duration::seconds(10))
            .await,
        RateDecision::Denied {
            reset_at: t0 + chrono::Duration::seconds(60)
        }
    );
}

#[tokio::test]
async fn denial_does_not_extend_or_count() {
    let (limiter, store) = limiter().await;
    let t0 = Utc::now();
    for _ in 0..3 {
        limiter.check_at("client", &LIMITS, t0).await;
    }
    for n in 1..5 {
        let decision = limiter
            .check_at("client", &LIMITS, t0 + chrono::Duration::seconds(n))
            .await;
        assert!(matches!(decision, RateDecision::Denied { .. }));
    }

    let entry: RateLimitEntry = get_json(store.as_ref(), "ratelimit:client")
        .await
        .expect("read entry")
        .expect("entry present");
    assert_eq!(entry.requests, 3);
    assert_eq!(entry.first_request, t0);
}

#[tokio::test]
async fn new_window_after_expiry() {
    let (limiter, _store) = limiter().await;
    let t0 = Utc::now();
    for _ in 0..3 {
        limiter.check_at("client", &LIMITS, t0).await;
    }

    let later = t0 + chrono::Duration::seconds(61);
    assert_eq!(
        limiter.check_at("client", &LIMITS, later).await,
        RateDecision::Allowed { remaining: 2 }
    );
}

#[tokio::test]
async fn clients_are_counted_separately() {
    let (limiter, _store) = limiter().await;
    let t0 = Utc::now();
    for _ in 0..3 {
        limiter.check_at("a", &LIMITS, t0).await;
    }
    assert!(matches!(
        limiter.check_at("a", &LIMITS, t0).await,
        RateDecision::Denied { .. }
    ));
    assert!(matches!(
        limiter.check_at("b", &LIMITS, t0).await,
        RateDecision::Allowed { .. }
    ));
}

#[tokio::test]
async fn entry_uses_camel_case_fields() {
    let (limiter, store) = limiter().await;
    limiter.check("client", &LIMITS).await;

    let raw = store
        .get("ratelimit:client")
        .await
        .expect("read")
        .expect("entry present");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["requests"], 1);
    assert!(value.get("firstRequest").is_some());
    assert!(value.get("lastRequest").is_some());
}

#[tokio::test]
async fn store_failure_fails_open() {
    let limiter = RateLimiter::new(Arc::new(BrokenStore), KeyLocks::new());
    for _ in 0..10 {
        assert!(matches!(
            limiter.check("client", &LIMITS).await,
            RateDecision::Allowed { .. }
        ));
    }
}
