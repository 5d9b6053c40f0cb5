// Outcome tracking for fire-and-forget work.
//
// Scan recording never blocks the redirect, so its failures would otherwise be
// invisible. The tracker keeps running counters and the last error so the
// health endpoint can surface them.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use utoipa::ToSchema;

/// Shared counters for background task outcomes; cloning shares state
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    succeeded: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    last_error: Arc<Mutex<Option<String>>>,
}

/// Point-in-time tracker snapshot for the health report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskStatus {
    pub succeeded: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, error: impl Into<String>) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(error.into());
        }
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_error: self.last_error.lock().ok().and_then(|g| g.clone()),
        }
    }
}
