//! In-memory rate limiting for upload-ticket requests.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<IpAddr, VecDeque<Instant>>`
//! plus one global window. `POST /api/objects/upload` is unauthenticated and
//! every accepted call parks a ticket for its whole TTL, so the global limit
//! bounds the ticket table at `global_limit * ttl / window` entries.
//!
//! Requests without a peer address (in-process routers, tests) count toward
//! the global window only.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::StatusCode;

use crate::config::StudioConfig;
use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_client_limit: usize,
    pub global_limit: usize,
    pub window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_studio(config: &StudioConfig) -> Self {
        Self {
            per_client_limit: config.upload_rate_per_client,
            global_limit: config.upload_rate_global,
            window: Duration::from_secs(config.upload_rate_window_secs),
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum RateLimitError {
    #[error("per-client upload limit exceeded (max {limit} requests/{window_secs}s)")]
    PerClientExceeded { limit: usize, window_secs: u64 },
    #[error("global upload limit exceeded (max {limit} requests/{window_secs}s)")]
    GlobalExceeded { limit: usize, window_secs: u64 },
}

impl ErrorCode for RateLimitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PerClientExceeded { .. } => "E_RATE_LIMITED",
            Self::GlobalExceeded { .. } => "E_RATE_LIMITED_GLOBAL",
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

#[derive(Default)]
struct RateLimiterInner {
    client_requests: HashMap<IpAddr, VecDeque<Instant>>,
    global_requests: VecDeque<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(RateLimiterInner::default())), config }
    }

    /// Check both limits, then record the request.
    ///
    /// # Errors
    ///
    /// Returns which limit the request would exceed. Rejected requests are
    /// not recorded.
    pub fn check_and_record(&self, client: Option<IpAddr>) -> Result<(), RateLimitError> {
        self.check_and_record_at(client, Instant::now())
    }

    fn check_and_record_at(&self, client: Option<IpAddr>, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        prune_window(&mut inner.global_requests, now, cfg.window);
        if inner.global_requests.len() >= cfg.global_limit {
            return Err(RateLimitError::GlobalExceeded {
                limit: cfg.global_limit,
                window_secs: cfg.window.as_secs(),
            });
        }

        if let Some(ip) = client {
            // Every live client entry has a request in the global window.
            if inner.client_requests.len() > cfg.global_limit {
                inner.client_requests.retain(|_, deque| {
                    prune_window(deque, now, cfg.window);
                    !deque.is_empty()
                });
            }

            let client_deque = inner.client_requests.entry(ip).or_default();
            prune_window(client_deque, now, cfg.window);
            if client_deque.len() >= cfg.per_client_limit {
                return Err(RateLimitError::PerClientExceeded {
                    limit: cfg.per_client_limit,
                    window_secs: cfg.window.as_secs(),
                });
            }
            client_deque.push_back(now);
        }

        inner.global_requests.push_back(now);
        Ok(())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .client_requests
            .len()
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
