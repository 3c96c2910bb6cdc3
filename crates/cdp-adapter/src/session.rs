use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_primitives::{
    validate_url, ActionError, Extractor, InputInjector, Navigator, PointerSequence,
    VisualCapture,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};
use webprobe_core_types::{DocumentId, ExtractionReport};

use crate::chromium::ChromiumLauncher;
use crate::config::CdpConfig;
use crate::error::CdpAdapterError;
use crate::metrics;
use crate::scripts::{extraction_script, parse_extraction, PING_SCRIPT};
use crate::transport::{DocumentState, PageDriver, PageFactory};

struct DocumentEntry {
    driver: Arc<dyn PageDriver>,
    state: Arc<DocumentState>,
}

/// Browser-backed implementation of every action primitive.
///
/// Each opened document maps to one page; load, console and network events
/// of that page are collected into its [`DocumentState`].
pub struct ChromiumSession {
    cfg: CdpConfig,
    factory: Arc<dyn PageFactory>,
    documents: DashMap<DocumentId, DocumentEntry>,
}

impl ChromiumSession {
    /// Launch Chromium according to `cfg`.
    pub async fn launch(cfg: CdpConfig) -> Result<Self, CdpAdapterError> {
        let launcher = ChromiumLauncher::launch(&cfg).await?;
        Ok(Self::with_factory(cfg, Arc::new(launcher)))
    }

    pub fn with_factory(cfg: CdpConfig, factory: Arc<dyn PageFactory>) -> Self {
        Self {
            cfg,
            factory,
            documents: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CdpConfig {
        &self.cfg
    }

    pub fn open_documents(&self) -> usize {
        self.documents.len()
    }

    fn entry(
        &self,
        doc: &DocumentId,
    ) -> Result<(Arc<dyn PageDriver>, Arc<DocumentState>), ActionError> {
        self.documents
            .get(doc)
            .map(|entry| (entry.driver.clone(), entry.state.clone()))
            .ok_or_else(|| ActionError::DocumentNotFound(doc.to_string()))
    }

    /// Close every open document.
    pub async fn shutdown(&self) {
        let docs: Vec<DocumentId> = self.documents.iter().map(|e| e.key().clone()).collect();
        for doc in docs {
            if let Err(err) = Navigator::close(self, &doc).await {
                warn!(document = %doc, ?err, "failed to close document during shutdown");
            }
        }
    }
}

async fn instrumented<T, F>(method: &str, fut: F) -> Result<T, CdpAdapterError>
where
    F: Future<Output = Result<T, CdpAdapterError>>,
{
    metrics::record_command(method);
    let started = Instant::now();
    let result = fut.await;
    match &result {
        Ok(_) => metrics::record_command_success(method, started.elapsed()),
        Err(err) => {
            metrics::record_command_failure(method);
            debug!(method, %err, "cdp command failed");
        }
    }
    result
}

#[async_trait]
impl Navigator for ChromiumSession {
    async fn open(&self, url: &str) -> Result<DocumentId, ActionError> {
        validate_url(url)?;
        let state = Arc::new(DocumentState::new());
        let driver = instrumented("Target.createTarget", self.factory.open_page(url, state.clone()))
            .await?;
        let doc = DocumentId::new();
        self.documents
            .insert(doc.clone(), DocumentEntry { driver, state });
        info!(document = %doc, %url, "document opened");
        Ok(doc)
    }

    async fn wait_until_loaded(
        &self,
        doc: &DocumentId,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        let (_, state) = self.entry(doc)?;
        state.readiness.wait_complete(timeout).await
    }

    async fn close(&self, doc: &DocumentId) -> Result<(), ActionError> {
        let Some((_, entry)) = self.documents.remove(doc) else {
            return Ok(());
        };
        instrumented("Target.closeTarget", entry.driver.close()).await?;
        debug!(document = %doc, "document closed");
        Ok(())
    }
}

#[async_trait]
impl Extractor for ChromiumSession {
    async fn ping(&self, doc: &DocumentId) -> Result<(), ActionError> {
        let (driver, _) = self.entry(doc)?;
        let value = instrumented("Runtime.evaluate", driver.evaluate(PING_SCRIPT))
            .await
            .map_err(|err| ActionError::ExtractorUnavailable(err.to_string()))?;
        match value {
            Value::Bool(true) => Ok(()),
            other => Err(ActionError::ExtractorUnavailable(format!(
                "ping returned {other}"
            ))),
        }
    }

    async fn extract(&self, doc: &DocumentId) -> Result<ExtractionReport, ActionError> {
        let (driver, state) = self.entry(doc)?;
        let script = extraction_script(self.cfg.max_text_len);
        let value = instrumented("Runtime.evaluate", driver.evaluate(&script)).await?;
        let mut report = parse_extraction(value)?;
        let (console, network) = state.drain_errors();
        report.console_errors = console;
        report.network_errors = network;
        debug!(
            document = %doc,
            elements = report.elements.len(),
            console_errors = report.console_errors.len(),
            network_errors = report.network_errors.len(),
            "extraction complete"
        );
        Ok(report)
    }
}

#[async_trait]
impl InputInjector for ChromiumSession {
    async fn inject(
        &self,
        doc: &DocumentId,
        sequence: &PointerSequence,
    ) -> Result<(), ActionError> {
        let (driver, _) = self.entry(doc)?;
        let events = sequence.events();
        for (i, event) in events.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(sequence.dwell).await;
            }
            instrumented("Input.dispatchMouseEvent", driver.dispatch_mouse(event))
                .await
                .map_err(|err| ActionError::InjectionFailed(err.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl VisualCapture for ChromiumSession {
    async fn capture(&self, doc: &DocumentId) -> Result<Option<String>, ActionError> {
        let (driver, _) = self.entry(doc)?;
        let bytes = instrumented("Page.captureScreenshot", driver.capture_png())
            .await
            .map_err(|err| ActionError::CaptureFailed(err.to_string()))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(STANDARD.encode(bytes)))
    }
}
