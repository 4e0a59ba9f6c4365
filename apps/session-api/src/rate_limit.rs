//! # Rate Limiting
//!
//! Fixed-window request limiting per client IP for `/api/session`.
//!
//! ## Window Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check(client)                                                          │
//! │    ├── no window / window over  → new window, count = 1, allowed       │
//! │    ├── count < limit            → count += 1, allowed                  │
//! │    └── count == limit           → denied until the window resets       │
//! │                                                                         │
//! │  Every response: X-RateLimit-Limit / -Remaining / -Reset (epoch secs)  │
//! │  Denied:         429, Retry-After, {"error", "retryAfter"}             │
//! │  Background:     prune() drops finished windows every 5 minutes        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State is per process. Several replicas each keep their own counters.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ApiError;

/// How often finished windows are dropped.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Key used when no proxy header names the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Outcome of one [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time left until the client's window resets.
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// Whole seconds the client should wait, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs() + u64::from(self.reset_in.subsec_nanos() > 0);
        secs.max(1)
    }

    /// Unix timestamp (seconds) of the window reset.
    pub fn reset_epoch_secs(&self) -> i64 {
        let reset_in = chrono::Duration::from_std(self.reset_in).unwrap_or_else(|_| chrono::Duration::zero());
        (Utc::now() + reset_in).timestamp()
    }

    /// Writes the `X-RateLimit-*` headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(LIMIT_HEADER, HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER, HeaderValue::from(self.remaining));
        headers.insert(RESET_HEADER, HeaderValue::from(self.reset_epoch_secs()));
    }
}

/// Rate limiter statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStats {
    pub tracked_clients: usize,
    pub limited_clients: usize,
}

/// Fixed-window limiter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        RateLimiter {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Counts one request from `client` and says whether it may proceed.
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        let window = clients.entry(client.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= window.reset_at {
            *window = Window {
                count: 0,
                reset_at: now + self.window,
            };
        }

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests - window.count,
            reset_in: window.reset_at.saturating_duration_since(now),
        }
    }

    /// Drops windows that have ended. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, window| now < window.reset_at);
        before - clients.len()
    }

    pub async fn stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let clients = self.clients.lock().await;
        RateLimitStats {
            tracked_clients: clients.len(),
            limited_clients: clients
                .values()
                .filter(|w| now < w.reset_at && w.count >= self.max_requests)
                .count(),
        }
    }

    /// Runs [`prune`](Self::prune) every `every` until the task is aborted.
    pub fn spawn_pruner(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = self.prune().await;
                if removed > 0 {
                    debug!(removed, "Pruned expired rate limit windows");
                }
            }
        })
    }
}

/// Client key from proxy headers: first `x-forwarded-for` entry, then
/// `x-real-ip`, then `x-client-ip`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    header("x-real-ip")
        .or_else(|| header("x-client-ip"))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Middleware: counts the request, rejects over-limit clients with 429 and
/// stamps the limit headers on every response.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(request.headers());
    let decision = limiter.check(&client).await;

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(
            client = %client,
            path = %request.uri().path(),
            retry_after = decision.retry_after_secs(),
            "Rate limit exceeded"
        );
        ApiError::RateLimited {
            retry_after: decision.retry_after_secs(),
        }
        .into_response()
    };

    decision.apply_headers(response.headers_mut());
    response
}

// =============================================================================
// Unit Tests
// =============================================================================
