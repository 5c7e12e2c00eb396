use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

const FALLBACK_CALLER: &str = "127.0.0.1";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug)]
struct Ledger {
    callers: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Fixed-window request counter keyed by caller address.
///
/// Expired windows are swept at most once per window length, so the table only
/// holds callers seen within roughly the last two windows.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    ledger: Mutex<Ledger>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            ledger: Mutex::new(Ledger {
                callers: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request; `false` once the caller is over the limit.
    pub fn check(&self, caller: &str) -> bool {
        self.check_at(caller, Instant::now())
    }

    fn check_at(&self, caller: &str, now: Instant) -> bool {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        if now.saturating_duration_since(ledger.last_sweep) > self.window {
            let window = self.window;
            let before = ledger.callers.len();
            ledger
                .callers
                .retain(|_, w| now.saturating_duration_since(w.started) <= window);
            ledger.last_sweep = now;
            tracing::debug!(
                dropped = before - ledger.callers.len(),
                "swept expired rate-limit windows"
            );
        }

        let entry = ledger
            .callers
            .entry(caller.to_string())
            .or_insert(Window { count: 0, started: now });

        if now.saturating_duration_since(entry.started) > self.window {
            entry.count = 1;
            entry.started = now;
        } else {
            entry.count = entry.count.saturating_add(1);
        }
        entry.count <= self.limit
    }
}

fn caller_of(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_CALLER)
        .to_string()
}

pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let caller = caller_of(&request);
    if !limiter.check(&caller) {
        tracing::warn!(%caller, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Too Many Requests",
                "retryAfter": limiter.window().as_secs(),
            })),
        )
            .into_response();
    }
    next.run(request).await
}
