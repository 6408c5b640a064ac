//! Per-client fixed-window rate limiter for the public booking endpoint.
//!
//! One counter per client id lives under `ratelimit:<client>`. The first
//! request opens a window; requests inside it increment the counter until
//! `max_requests` is reached, after which callers are denied until the
//! window ends. A request arriving after the window starts a new one.
//!
//! The limiter fails open: when the counter cannot be read or written the
//! request is allowed and the failure is logged.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::settings::RateLimitSettings;
use crate::persistence::kv::{get_json, put_json, KeyValueStore};
use crate::persistence::locks::KeyLocks;

/// Bucket shared by every client whose address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Persisted counter for one client id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEntry {
    /// Requests counted in the current window.
    pub requests: u32,
    /// Start of the current window.
    pub first_request: DateTime<Utc>,
    /// Most recent counted request.
    pub last_request: DateTime<Utc>,
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request is admitted.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// The client exhausted its budget.
    Denied {
        /// Instant at which the current window ends.
        reset_at: DateTime<Utc>,
    },
}

/// Fixed-window limiter over the shared key/value store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
}

impl RateLimiter {
    /// Construct a limiter over the shared store and lock table.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, locks: KeyLocks) -> Self {
        Self { store, locks }
    }

    /// Count one request from `client_id` against `limits`.
    pub async fn check(&self, client_id: &str, limits: &RateLimitSettings) -> RateDecision {
        self.check_at(client_id, limits, Utc::now()).await
    }

    /// Count one request at an explicit instant.
    pub async fn check_at(
        &self,
        client_id: &str,
        limits: &RateLimitSettings,
        now: DateTime<Utc>,
    ) -> RateDecision {
        let key = format!("ratelimit:{client_id}");
        let _guard = self.locks.lock(&key).await;

        let window = Duration::seconds(i64::try_from(limits.window_seconds).unwrap_or(i64::MAX));
        let existing = match get_json::<RateLimitEntry>(self.store.as_ref(), &key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(client = client_id, %err, "rate limit read failed, allowing request");
                return RateDecision::Allowed {
                    remaining: limits.max_requests.saturating_sub(1),
                };
            }
        };

        let entry = match existing {
            Some(entry) if now < entry.first_request + window => {
                if entry.requests >= limits.max_requests {
                    let reset_at = entry.first_request + window;
                    debug!(client = client_id, %reset_at, "rate limit exceeded");
                    return RateDecision::Denied { reset_at };
                }
                RateLimitEntry {
                    requests: entry.requests + 1,
                    first_request: entry.first_request,
                    last_request: now,
                }
            }
            _ => RateLimitEntry {
                requests: 1,
                first_request: now,
                last_request: now,
            },
        };

        let ttl = (entry.first_request + window - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(1));
        if let Err(err) = put_json(self.store.as_ref(), &key, &entry, Some(ttl)).await {
            warn!(client = client_id, %err, "rate limit write failed, allowing request");
        }

        RateDecision::Allowed {
            remaining: limits.max_requests.saturating_sub(entry.requests),
        }
    }
}

/// Derive the rate limit identity of a caller.
///
/// Prefers the edge proxy header `cf-connecting-ip`, then `x-real-ip`,
/// then the first hop of `x-forwarded-for`, then the socket peer address.
/// Falls back to [`UNKNOWN_CLIENT`].
#[must_use]
pub fn client_id_from_headers(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_owned)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}
