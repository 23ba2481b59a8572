//! Request rate limiting for the front door.
//!
//! A sliding window caps how many tasks are accepted per period. Upstream
//! rate-limit responses additionally put the limiter into exponential
//! backoff until a success is recorded.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    /// Requests accepted per window.
    pub max_requests: usize,
    /// Window length (seconds).
    pub window_secs: u64,
    /// Maximum backoff after upstream rate limiting (seconds).
    pub max_backoff_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 15,
            window_secs: 60,
            max_backoff_secs: 120,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Sliding-window limiter with backoff.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Times of accepted requests inside the current window.
    requests: VecDeque<Instant>,
    /// When requests may resume after upstream rate limiting.
    backoff_until: Option<Instant>,
    /// Number of consecutive upstream rate limit hits.
    consecutive_hits: u32,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: VecDeque::new(),
            backoff_until: None,
            consecutive_hits: 0,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check if a request may be made now.
    pub fn can_make_request(&mut self) -> bool {
        self.can_make_request_at(Instant::now())
    }

    pub fn can_make_request_at(&mut self, now: Instant) -> bool {
        self.prune(now);
        let backing_off = self.backoff_until.is_some_and(|until| now < until);
        !backing_off && self.requests.len() < self.config.max_requests
    }

    /// Record an accepted request.
    pub fn record_request(&mut self) {
        self.record_request_at(Instant::now());
    }

    pub fn record_request_at(&mut self, now: Instant) {
        self.prune(now);
        self.requests.push_back(now);
    }

    /// How long until the next request would be accepted.
    pub fn wait_time(&mut self) -> Duration {
        self.wait_time_at(Instant::now())
    }

    pub fn wait_time_at(&mut self, now: Instant) -> Duration {
        self.prune(now);
        let backoff = self
            .backoff_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default();

        let window = if self.requests.len() < self.config.max_requests {
            Duration::ZERO
        } else {
            // The slot frees when the oldest request that keeps us at the cap expires.
            let idx = self.requests.len() - self.config.max_requests;
            self.requests
                .get(idx)
                .map(|t| (*t + self.config.window()).saturating_duration_since(now))
                .unwrap_or_default()
        };

        backoff.max(window)
    }

    /// Record an upstream rate limit response.
    ///
    /// The delay is the larger of `retry_after` and 2^hits seconds, capped at
    /// `max_backoff_secs`.
    pub fn record_rate_limit(&mut self, retry_after: Duration) {
        self.consecutive_hits += 1;

        let exp_backoff = Duration::from_secs(2u64.pow(self.consecutive_hits.min(6)));
        let delay = retry_after
            .max(exp_backoff)
            .min(Duration::from_secs(self.config.max_backoff_secs));

        self.backoff_until = Some(Instant::now() + delay);

        tracing::warn!(
            retry_after_secs = delay.as_secs(),
            consecutive_hits = self.consecutive_hits,
            "Rate limited, backing off"
        );
    }

    /// Record a successful upstream call; clears any backoff.
    pub fn record_success(&mut self) {
        self.consecutive_hits = 0;
        self.backoff_until = None;
    }

    fn prune(&mut self, now: Instant) {
        let window = self.config.window();
        while let Some(first) = self.requests.front() {
            if now.saturating_duration_since(*first) >= window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
