use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agent_core::ExplorationOrchestrator;
use parking_lot::Mutex;
use serde::Serialize;

/// Shared by every handler.
#[derive(Clone)]
pub struct ServeState {
    pub orchestrator: ExplorationOrchestrator,
    pub health: Arc<ServeHealth>,
}

impl ServeState {
    pub fn new(orchestrator: ExplorationOrchestrator) -> Self {
        Self {
            orchestrator,
            health: Arc::new(ServeHealth::new()),
        }
    }

    pub fn health_snapshot(&self) -> HealthSnapshot {
        self.health.snapshot()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub ready: bool,
    pub live: bool,
    pub last_ready_check: Option<u64>,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct ServeHealth {
    live: AtomicBool,
    ready: AtomicBool,
    last_ready_check: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ServeHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_live(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        self.touch();
        *self.last_error.lock() = None;
    }

    pub fn mark_unready(&self, error: impl Into<String>) {
        self.ready.store(false, Ordering::SeqCst);
        self.touch();
        *self.last_error.lock() = Some(error.into());
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            ready: self.ready.load(Ordering::SeqCst),
            live: self.live.load(Ordering::SeqCst),
            last_ready_check: match self.last_ready_check.load(Ordering::SeqCst) {
                0 => None,
                value => Some(value),
            },
            last_error: self.last_error.lock().clone(),
        }
    }

    fn touch(&self) {
        if let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) {
            self.last_ready_check
                .store(duration.as_secs(), Ordering::SeqCst);
        }
    }
}
