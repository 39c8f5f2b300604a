//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Rendering and imaging are stateless, so the only shared pieces are the
//! parsed config, the storage service wrapping the selected backend, and
//! the limiter guarding upload-ticket issue.

use std::sync::Arc;

use crate::config::StudioConfig;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::storage::{MemoryStore, ObjectStore, StorageService};

/// Clone is required by Axum; every field is Arc-wrapped or shares an Arc.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StudioConfig>,
    pub storage: Arc<StorageService>,
    pub upload_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<StudioConfig>, store: Arc<dyn ObjectStore>) -> Self {
        let storage = Arc::new(StorageService::new(store, &config));
        let upload_limiter = RateLimiter::new(RateLimitConfig::from_studio(&config));
        Self { config, storage, upload_limiter }
    }

    /// State backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory(public_base_url: &str) -> Self {
        Self::new(Arc::new(StudioConfig::in_memory(public_base_url)), Arc::new(MemoryStore::new()))
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
