//! Shared application state for the HTTP layer.
//!
//! `CoreState` owns the document store and the runtime configuration. It is
//! wrapped in `Arc` at startup and handed to the router.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;

use crate::config::Config;
use crate::db::{DatabaseError, DocumentStore};
use crate::demo;

pub struct CoreState {
    store: DocumentStore,
    pub config: Config,
    started_at: Instant,
    requests_served: AtomicU64,
}

impl CoreState {
    /// Open the store described by `config`: the on-disk database, or a
    /// seeded in-memory store in demo mode.
    pub fn open(config: Config) -> Result<Self, DatabaseError> {
        if config.demo {
            return Self::demo(config);
        }
        let store = DocumentStore::open(&config.database_path())?;
        Ok(Self::with_store(store, config))
    }

    pub fn demo(config: Config) -> Result<Self, DatabaseError> {
        let store = DocumentStore::open_in_memory()?;
        let now = Utc::now();
        demo::seed_demo_data(&store, now.date_naive(), now)?;
        tracing::info!("Running in demo mode with an in-memory store");
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: DocumentStore, config: Config) -> Self {
        Self {
            store,
            config,
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    /// Record one handled request in the access log.
    pub fn log_access(&self, method: &str, path: &str, status: u16, elapsed_ms: u64) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            tracing::warn!(target: "clinicdesk::access", method, path, status, elapsed_ms, "request failed");
        } else {
            tracing::info!(target: "clinicdesk::access", method, path, status, elapsed_ms, "request");
        }
    }
}
