use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

/// Outcome of one attempt against the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window attempt counter keyed by client address.
///
/// The first attempt for a key, or the first after its window elapsed,
/// resets the count to one. An empty key is always allowed.
#[derive(Debug)]
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

pub type SharedRateLimiter = Arc<LoginRateLimiter>;

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn shared(max_attempts: u32, window: Duration) -> SharedRateLimiter {
        Arc::new(Self::new(max_attempts, window))
    }

    pub fn allow(&self, key: &str) -> RateDecision {
        self.allow_at(key, Instant::now())
    }

    pub fn allow_at(&self, key: &str, now: Instant) -> RateDecision {
        if key.is_empty() {
            return RateDecision::Allowed;
        }

        // A poisoned map only means another request panicked mid-update;
        // the counters are still usable.
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        let elapsed = now.saturating_duration_since(entry.started);
        if entry.count == 0 || elapsed >= self.window {
            *entry = Window { started: now, count: 1 };
            return RateDecision::Allowed;
        }

        if entry.count < self.max_attempts {
            entry.count += 1;
            return RateDecision::Allowed;
        }

        let remaining = self.window.saturating_sub(elapsed);
        let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        RateDecision::Limited { retry_after_secs: retry_after_secs.max(1) }
    }

    /// Drops windows that have fully elapsed.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`. Empty when neither
/// header carries an address.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded.or_else(real_ip).unwrap_or_default().to_string()
}
