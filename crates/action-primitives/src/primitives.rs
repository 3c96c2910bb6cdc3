//! Collaborator traits
//!
//! Each trait is one capability the explorer consumes. A single backend may
//! implement all four (see [`PrimitiveSet::from_backend`]) or tests may script
//! them independently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use webprobe_core_types::{DocumentId, ExtractionReport};

use crate::{errors::ActionError, pointer::PointerSequence};

/// Opens documents and reports when they finished loading.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Open a new document at `url` and return its handle.
    async fn open(&self, url: &str) -> Result<DocumentId, ActionError>;

    /// Suspend until the document is load-complete, failing with
    /// [`ActionError::NavTimeout`] once `timeout` elapses.
    async fn wait_until_loaded(
        &self,
        doc: &DocumentId,
        timeout: Duration,
    ) -> Result<(), ActionError>;

    /// Release the document. Implementations without per-document resources keep the default.
    async fn close(&self, _doc: &DocumentId) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Lists interactive elements and the errors captured since the last call.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Check that the extraction capability is reachable in the document context.
    async fn ping(&self, doc: &DocumentId) -> Result<(), ActionError>;

    /// Run one extraction cycle.
    async fn extract(&self, doc: &DocumentId) -> Result<ExtractionReport, ActionError>;
}

/// Dispatches trusted pointer input.
#[async_trait]
pub trait InputInjector: Send + Sync {
    async fn inject(&self, doc: &DocumentId, sequence: &PointerSequence)
        -> Result<(), ActionError>;
}

/// Snapshots the current view as a base64 PNG.
#[async_trait]
pub trait VisualCapture: Send + Sync {
    /// `Ok(None)` means the backend had nothing to capture.
    async fn capture(&self, doc: &DocumentId) -> Result<Option<String>, ActionError>;
}

/// The four capabilities bundled for the explorer.
#[derive(Clone)]
pub struct PrimitiveSet {
    pub navigator: Arc<dyn Navigator>,
    pub extractor: Arc<dyn Extractor>,
    pub injector: Arc<dyn InputInjector>,
    pub capture: Arc<dyn VisualCapture>,
}

impl PrimitiveSet {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        extractor: Arc<dyn Extractor>,
        injector: Arc<dyn InputInjector>,
        capture: Arc<dyn VisualCapture>,
    ) -> Self {
        Self {
            navigator,
            extractor,
            injector,
            capture,
        }
    }

    /// Use one backend for every capability.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Navigator + Extractor + InputInjector + VisualCapture + 'static,
    {
        Self {
            navigator: backend.clone(),
            extractor: backend.clone(),
            injector: backend.clone(),
            capture: backend,
        }
    }
}

/// Accept only URLs a navigator can open.
pub fn validate_url(url: &str) -> Result<(), ActionError> {
    if url.is_empty() {
        return Err(ActionError::InvalidUrl("URL cannot be empty".to_string()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with("file://") {
        return Err(ActionError::InvalidUrl(format!(
            "Invalid URL scheme: {}",
            url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("file:///path/to/file.html").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com").is_err());
    }
}
