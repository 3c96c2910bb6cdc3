//! Seam between the session and the browser.
//!
//! [`PageDriver`] is one live page, [`PageFactory`] opens pages and wires
//! their events into a [`DocumentState`]. The Chromium implementation lives in
//! `chromium.rs`; tests substitute scripted drivers that record commands.

use std::sync::Arc;

use action_primitives::{PointerEvent, ReadinessSignal};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::CdpAdapterError;
use crate::metrics;

/// Cap on buffered errors per category between two extractions.
pub const MAX_BUFFERED_ERRORS: usize = 100;

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Evaluate `script` in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<Value, CdpAdapterError>;

    /// Dispatch one `Input.dispatchMouseEvent`.
    async fn dispatch_mouse(&self, event: &PointerEvent) -> Result<(), CdpAdapterError>;

    /// Capture the viewport as PNG bytes.
    async fn capture_png(&self) -> Result<Vec<u8>, CdpAdapterError>;

    async fn close(&self) -> Result<(), CdpAdapterError>;
}

#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Open a page at `url`; page events must be reported into `state`.
    async fn open_page(
        &self,
        url: &str,
        state: Arc<DocumentState>,
    ) -> Result<Arc<dyn PageDriver>, CdpAdapterError>;
}

/// Event-fed state of one open document.
#[derive(Debug, Default)]
pub struct DocumentState {
    pub readiness: ReadinessSignal,
    console_errors: Mutex<Vec<String>>,
    network_errors: Mutex<Vec<String>>,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_navigation_started(&self) {
        metrics::record_event();
        self.readiness.mark_loading();
    }

    pub fn on_load_complete(&self) {
        metrics::record_event();
        self.readiness.mark_complete();
    }

    pub fn push_console_error(&self, message: impl Into<String>) {
        metrics::record_event();
        push_bounded(&self.console_errors, message.into());
    }

    pub fn push_network_error(&self, message: impl Into<String>) {
        metrics::record_event();
        push_bounded(&self.network_errors, message.into());
    }

    /// Take the console and network errors captured since the previous drain.
    pub fn drain_errors(&self) -> (Vec<String>, Vec<String>) {
        let console = std::mem::take(&mut *self.console_errors.lock());
        let network = std::mem::take(&mut *self.network_errors.lock());
        (console, network)
    }
}

fn push_bounded(buffer: &Mutex<Vec<String>>, message: String) {
    let mut guard = buffer.lock();
    if guard.len() >= MAX_BUFFERED_ERRORS {
        guard.remove(0);
    }
    guard.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::LoadState;

    #[test]
    fn drain_empties_both_buffers() {
        let state = DocumentState::new();
        state.push_console_error("TypeError: x is undefined");
        state.push_network_error("404 https://a.test/missing.js");
        let (console, network) = state.drain_errors();
        assert_eq!(console.len(), 1);
        assert_eq!(network.len(), 1);
        let (console, network) = state.drain_errors();
        assert!(console.is_empty() && network.is_empty());
    }

    #[test]
    fn buffers_drop_oldest_beyond_cap() {
        let state = DocumentState::new();
        for i in 0..(MAX_BUFFERED_ERRORS + 5) {
            state.push_console_error(format!("err {i}"));
        }
        let (console, _) = state.drain_errors();
        assert_eq!(console.len(), MAX_BUFFERED_ERRORS);
        assert_eq!(console[0], "err 5");
    }

    #[test]
    fn navigation_events_drive_readiness() {
        let state = DocumentState::new();
        state.on_load_complete();
        assert_eq!(state.readiness.state(), LoadState::Complete);
        state.on_navigation_started();
        assert_eq!(state.readiness.state(), LoadState::Loading);
    }
}
