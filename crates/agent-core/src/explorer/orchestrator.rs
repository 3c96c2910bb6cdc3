//! Exploration orchestrator.
//!
//! Each iteration waits for the document, extracts candidates, records a
//! step with any observed errors, asks the oracle for the next element and
//! clicks it. Iterations run as spawned tasks; at most one is in flight at a
//! time and the next one is scheduled only after the current one released
//! its guard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionError, PointerSequence, PrimitiveSet};
use element_identity::{group_by_fingerprint, identity_key, normalize_page_url};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use webprobe_core_types::{
    DetectedIssue, DocumentId, ExtractionReport, IssueKind, IssueSeverity, RunId, RunStatus,
    TestRun, TestStep,
};

use crate::errors::ExplorerError;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::context::ExplorationContext;
use crate::explorer::guard::IterationGuard;
use crate::metrics;
use crate::oracle::{Candidate, DecisionOracle, PageValidationRequest};
use crate::record_store::{LogEntry, LogLevel, RunGeneration, RunRecordStore};

/// Read-only view for the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub is_running: bool,
    /// The active run, or the last finished one.
    pub current_run: Option<TestRun>,
    pub current_step_index: u32,
    pub recent_logs: Vec<LogEntry>,
}

/// Why a run stopped on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Converged,
    SamePageLimit { url: String, iterations: u32 },
    OracleFailed(String),
    NoSelection,
    OutOfRange(i64),
    Exhausted,
    TransientLimit(u32),
}

impl FinishReason {
    pub fn status(&self) -> RunStatus {
        match self {
            FinishReason::TransientLimit(_) => RunStatus::Failed,
            _ => RunStatus::Completed,
        }
    }

    fn level(&self) -> LogLevel {
        match self {
            FinishReason::OracleFailed(_) | FinishReason::TransientLimit(_) => LogLevel::Error,
            FinishReason::OutOfRange(_) | FinishReason::NoSelection => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    fn message(&self) -> String {
        match self {
            FinishReason::Converged => {
                "Exploration converged: no unvisited elements remain".to_string()
            }
            FinishReason::SamePageLimit { url, iterations } => {
                format!("Stopping: {iterations} consecutive iterations on {url}")
            }
            FinishReason::OracleFailed(err) => format!("Decision oracle failed: {err}"),
            FinishReason::NoSelection => "Decision oracle made no selection".to_string(),
            FinishReason::OutOfRange(index) => {
                format!("Decision oracle returned out-of-range index {index}")
            }
            FinishReason::Exhausted => "Every candidate was already visited".to_string(),
            FinishReason::TransientLimit(count) => {
                format!("Giving up after {count} consecutive transient failures")
            }
        }
    }
}

enum Outcome {
    Continue,
    Retry(String),
    Finished(FinishReason),
    /// The run this iteration belonged to is gone.
    Stale,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Continue => "continue",
            Outcome::Retry(_) => "retry",
            Outcome::Finished(_) => "finished",
            Outcome::Stale => "stale",
        }
    }
}

struct Inner {
    config: ExplorerConfig,
    primitives: PrimitiveSet,
    oracle: Arc<dyn DecisionOracle>,
    store: RunRecordStore,
    context: Mutex<ExplorationContext>,
    in_flight: Arc<AtomicBool>,
    /// Generation of the delayed iteration waiting to fire, 0 when none.
    pending: AtomicU64,
    idle: watch::Sender<bool>,
}

/// Drives one exploration run at a time. Cheap to clone.
#[derive(Clone)]
pub struct ExplorationOrchestrator {
    inner: Arc<Inner>,
}

impl ExplorationOrchestrator {
    pub fn new(
        config: ExplorerConfig,
        primitives: PrimitiveSet,
        oracle: Arc<dyn DecisionOracle>,
    ) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                config,
                primitives,
                oracle,
                store: RunRecordStore::new(),
                context: Mutex::new(ExplorationContext::default()),
                in_flight: Arc::new(AtomicBool::new(false)),
                pending: AtomicU64::new(0),
                idle,
            }),
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.inner.config
    }

    /// Opens `url`, creates a running run and schedules the first iteration.
    /// Returns without waiting for exploration. A run that is still active
    /// is discarded.
    pub async fn start_test(
        &self,
        url: &str,
        config_id: Option<String>,
    ) -> Result<RunId, ExplorerError> {
        let inner = &self.inner;
        let document = inner
            .primitives
            .navigator
            .open(url)
            .await
            .map_err(ExplorerError::DocumentOpen)?;

        let run = TestRun::new(url, inner.config.user_tag.clone(), config_id);
        let run_id = run.id.clone();
        let generation = inner.store.begin(run);
        let previous = {
            let mut ctx = inner.context.lock();
            std::mem::replace(&mut *ctx, ExplorationContext::for_run(document, generation))
                .document
        };
        if let Some(previous) = previous {
            inner.close_document(&previous).await;
        }
        inner.idle.send_replace(false);
        inner.store.log(LogLevel::Info, format!("Test started: {url}"));
        info!(target: "explorer", run_id = %run_id, %url, "exploration started");

        if let Some(guard) = IterationGuard::try_acquire(&inner.in_flight) {
            tokio::spawn(inner.clone().run_iteration(guard));
        }
        Ok(run_id)
    }

    /// Marks the active run completed and returns it. `None` when nothing
    /// is running.
    pub async fn stop_test(&self) -> Option<TestRun> {
        let inner = &self.inner;
        let run = inner.store.finish(RunStatus::Completed)?;
        let document = inner.context.lock().reset();
        if let Some(document) = document {
            inner.close_document(&document).await;
        }
        inner.idle.send_replace(true);
        metrics::record_run_finished(run.status.as_str());
        inner.store.log(
            LogLevel::Info,
            format!("Test stopped after {} step(s)", run.steps.len()),
        );
        info!(target: "explorer", run_id = %run.id, steps = run.steps.len(), "exploration stopped");
        Some(run)
    }

    pub fn status(&self) -> StatusSnapshot {
        let inner = &self.inner;
        StatusSnapshot {
            is_running: inner.store.is_running(),
            current_run: inner.store.current_or_last(),
            current_step_index: inner.context.lock().step_index,
            recent_logs: inner.store.recent_logs(),
        }
    }

    pub fn recent_logs(&self) -> Vec<LogEntry> {
        self.inner.store.recent_logs()
    }

    /// Runs one iteration now. Returns `false` if no run is active or an
    /// iteration is already in flight; dropped triggers are not queued.
    pub fn trigger(&self) -> bool {
        let inner = &self.inner;
        if !inner.store.is_running() {
            return false;
        }
        match IterationGuard::try_acquire(&inner.in_flight) {
            Some(guard) => {
                tokio::spawn(inner.clone().run_iteration(guard));
                true
            }
            None => {
                metrics::record_guard_rejection();
                debug!(target: "explorer", "iteration in flight, trigger dropped");
                false
            }
        }
    }

    /// Resolves once no run is active.
    pub async fn wait_until_idle(&self) {
        let mut idle = self.inner.idle.subscribe();
        let _ = idle.wait_for(|idle| *idle).await;
    }
}

impl Inner {
    /// Fires one iteration for the current run after `delay`. A timer left
    /// over from an earlier run neither blocks this one nor fires into it.
    fn schedule(self: &Arc<Self>, delay: Duration) {
        let generation = self.store.generation();
        if self.pending.swap(generation, Ordering::AcqRel) == generation {
            return;
        }
        let inner = self.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = inner.pending.compare_exchange(
                generation,
                0,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            if !inner.store.is_active(generation) {
                return;
            }
            // An in-flight iteration reschedules on its own once done.
            if let Some(guard) = IterationGuard::try_acquire(&inner.in_flight) {
                inner.run_iteration(guard).await;
            }
        });
    }

    async fn run_iteration(self: Arc<Self>, guard: IterationGuard) {
        let (document, generation) = {
            let ctx = self.context.lock();
            (ctx.document.clone(), ctx.generation)
        };
        let outcome = match document {
            Some(document) if self.store.is_active(generation) => {
                match self.iterate(&document, generation).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(target: "explorer", %err, "iteration failed");
                        self.store
                            .log(LogLevel::Error, format!("Iteration failed: {err}"));
                        Outcome::Retry(err.to_string())
                    }
                }
            }
            _ => Outcome::Stale,
        };
        metrics::record_iteration(outcome.label());

        let delay = match outcome {
            Outcome::Continue => self.config.settle_delay(),
            Outcome::Retry(reason) => {
                self.on_transient(generation, reason).await;
                self.config.retry_backoff()
            }
            Outcome::Finished(reason) => {
                self.finish(generation, reason).await;
                Duration::ZERO
            }
            Outcome::Stale => Duration::ZERO,
        };
        drop(guard);

        // Also picks up a run that was started while this iteration held
        // the guard.
        if self.store.is_running() {
            self.schedule(delay);
        }
    }

    async fn iterate(
        &self,
        document: &DocumentId,
        generation: RunGeneration,
    ) -> Result<Outcome, ActionError> {
        let primitives = &self.primitives;

        if let Err(err) = primitives
            .navigator
            .wait_until_loaded(document, self.config.load_timeout())
            .await
        {
            match err {
                ActionError::NavTimeout(_) => {
                    warn!(target: "explorer", %err, "load did not complete, continuing");
                    self.store.log(
                        LogLevel::Warn,
                        "Page load did not complete in time, continuing",
                    );
                }
                other => return Err(other),
            }
        }

        if let Err(err) = primitives.extractor.ping(document).await {
            return Ok(Outcome::Retry(format!("extractor unreachable: {err}")));
        }
        let report = match primitives.extractor.extract(document).await {
            Ok(report) if report.success => report,
            Ok(_) => return Ok(Outcome::Retry("extraction reported failure".to_string())),
            Err(err) => return Ok(Outcome::Retry(format!("extraction failed: {err}"))),
        };

        let page_url = normalize_page_url(&report.url);
        let Some(same_page) = self.with_context(generation, |ctx| {
            ctx.transient_failures = 0;
            ctx.observe_url(page_url.clone())
        }) else {
            return Ok(Outcome::Stale);
        };
        if same_page >= self.config.max_same_page_iterations {
            return Ok(Outcome::Finished(FinishReason::SamePageLimit {
                url: page_url,
                iterations: same_page,
            }));
        }

        let screenshot = self.capture(document).await;
        let Some(step) = self.store.append_step(generation, |run| {
            TestStep::navigate(
                run.id.clone(),
                run.next_sequence(),
                report.url.clone(),
                report.title.clone(),
                screenshot.clone(),
            )
        }) else {
            return Ok(Outcome::Stale);
        };
        self.with_context(generation, |ctx| ctx.step_index = step.sequence);
        self.store.log(
            LogLevel::Info,
            format!("Step {}: {} ({})", step.sequence, report.title, report.url),
        );
        self.record_error_issues(generation, &step, &report, &screenshot);
        if self.config.validate_pages {
            self.validate_page(generation, &step, &report, screenshot)
                .await;
        }

        let Some((candidates, keys)) = self.with_context(generation, |ctx| {
            let keys: Vec<String> = report.elements.iter().map(identity_key).collect();
            let candidates: Vec<Candidate> = report
                .elements
                .iter()
                .zip(&keys)
                .map(|(element, key)| {
                    Candidate::new(element.clone(), ctx.visited_elements.contains(key))
                })
                .collect();
            (candidates, keys)
        }) else {
            return Ok(Outcome::Stale);
        };
        let unvisited = candidates.iter().filter(|c| !c.visited).count();
        if candidates.is_empty() || unvisited == 0 {
            return Ok(Outcome::Finished(FinishReason::Converged));
        }
        for (fingerprint, indexes) in group_by_fingerprint(&report.elements) {
            if indexes.len() > 1 {
                debug!(target: "explorer", %fingerprint, ?indexes, "elements share a content-free fingerprint");
            }
        }
        debug!(target: "explorer", total = candidates.len(), unvisited, "consulting oracle");

        let choice = match self
            .oracle
            .pick_element(&candidates, &report.url, &report.title)
            .await
        {
            Ok(choice) => choice,
            Err(err) => {
                return Ok(Outcome::Finished(FinishReason::OracleFailed(
                    err.to_string(),
                )))
            }
        };
        let Some(index) = choice else {
            return Ok(Outcome::Finished(FinishReason::NoSelection));
        };
        let Some(mut position) = usize::try_from(index)
            .ok()
            .filter(|position| *position < candidates.len())
        else {
            return Ok(Outcome::Finished(FinishReason::OutOfRange(index)));
        };

        if candidates[position].visited {
            match candidates.iter().position(|c| !c.visited) {
                Some(first_unvisited) => {
                    info!(
                        target: "explorer",
                        picked = index,
                        replacement = first_unvisited,
                        "oracle picked a visited element, overriding"
                    );
                    position = first_unvisited;
                }
                None => return Ok(Outcome::Finished(FinishReason::Exhausted)),
            }
        }

        let key = keys[position].clone();
        if self
            .with_context(generation, |ctx| ctx.visited_elements.insert(key))
            .is_none()
        {
            return Ok(Outcome::Stale);
        }

        let element = &candidates[position].element;
        self.store.log(
            LogLevel::Info,
            format!("Clicking [{}] \"{}\"", element.element_type, element.text),
        );
        let sequence = PointerSequence::for_element(element).with_dwell(self.config.pointer_dwell());
        primitives.injector.inject(document, &sequence).await?;
        Ok(Outcome::Continue)
    }

    /// Runs `f` on the context if it still belongs to `generation`.
    fn with_context<R>(
        &self,
        generation: RunGeneration,
        f: impl FnOnce(&mut ExplorationContext) -> R,
    ) -> Option<R> {
        let mut ctx = self.context.lock();
        (ctx.generation == generation && ctx.document.is_some()).then(|| f(&mut ctx))
    }

    async fn capture(&self, document: &DocumentId) -> Option<String> {
        if !self.config.capture_screenshots {
            return None;
        }
        match self.primitives.capture.capture(document).await {
            Ok(shot) => shot,
            Err(err) => {
                warn!(target: "explorer", %err, "screenshot failed");
                self.store
                    .log(LogLevel::Warn, format!("Screenshot failed: {err}"));
                None
            }
        }
    }

    fn record_error_issues(
        &self,
        generation: RunGeneration,
        step: &TestStep,
        report: &ExtractionReport,
        screenshot: &Option<String>,
    ) {
        if !report.console_errors.is_empty() {
            let issue = DetectedIssue::new(
                step.run_id.clone(),
                step.id.clone(),
                IssueKind::ConsoleError,
                IssueSeverity::High,
                "Console errors detected",
                format!(
                    "{} console error(s) on {}",
                    report.console_errors.len(),
                    report.url
                ),
            )
            .with_screenshot(screenshot.clone())
            .with_console_errors(report.console_errors.clone());
            self.append_issue(generation, issue);
        }
        if !report.network_errors.is_empty() {
            let issue = DetectedIssue::new(
                step.run_id.clone(),
                step.id.clone(),
                IssueKind::NetworkError,
                IssueSeverity::Medium,
                "Network errors detected",
                format!(
                    "{} failed request(s) on {}",
                    report.network_errors.len(),
                    report.url
                ),
            )
            .with_screenshot(screenshot.clone())
            .with_network_errors(report.network_errors.clone());
            self.append_issue(generation, issue);
        }
    }

    async fn validate_page(
        &self,
        generation: RunGeneration,
        step: &TestStep,
        report: &ExtractionReport,
        screenshot: Option<String>,
    ) {
        let request = PageValidationRequest {
            url: report.url.clone(),
            title: report.title.clone(),
            screenshot: screenshot.clone(),
            console_errors: report.console_errors.clone(),
            network_errors: report.network_errors.clone(),
        };
        let validation = match self.oracle.validate_page(&request).await {
            Ok(validation) => validation,
            Err(err) => {
                warn!(target: "explorer", %err, "page validation failed");
                self.store
                    .log(LogLevel::Warn, format!("Page validation failed: {err}"));
                return;
            }
        };
        for reported in validation.issues {
            let kind = reported.kind.parse().unwrap_or(IssueKind::UiAnomaly);
            let severity = reported.severity.parse().unwrap_or(IssueSeverity::Medium);
            let issue = DetectedIssue::new(
                step.run_id.clone(),
                step.id.clone(),
                kind,
                severity,
                reported.title,
                reported.description,
            )
            .with_screenshot(screenshot.clone());
            self.append_issue(generation, issue);
        }
    }

    fn append_issue(&self, generation: RunGeneration, issue: DetectedIssue) {
        let kind = issue.kind;
        if self.store.append_issue(generation, issue) {
            metrics::record_issue(kind.as_str());
        }
    }

    async fn on_transient(&self, generation: RunGeneration, reason: String) {
        debug!(target: "explorer", %reason, "transient failure, backing off");
        let failures = self.with_context(generation, |ctx| {
            ctx.transient_failures += 1;
            ctx.transient_failures
        });
        let Some(failures) = failures else {
            return;
        };
        if let Some(limit) = self.config.max_transient_retries {
            if failures > limit {
                self.finish(generation, FinishReason::TransientLimit(failures))
                    .await;
                return;
            }
        }
        self.store.log(
            LogLevel::Warn,
            format!(
                "Retrying in {}ms after failure #{failures}: {reason}",
                self.config.retry_backoff_ms
            ),
        );
    }

    async fn finish(&self, generation: RunGeneration, reason: FinishReason) {
        let status = reason.status();
        let Some(run) = self.store.finish_if(generation, status) else {
            return;
        };
        self.store.log(reason.level(), reason.message());
        match reason.level() {
            LogLevel::Error => {
                error!(target: "explorer", run_id = %run.id, reason = %reason.message(), "exploration ended")
            }
            _ => {
                info!(target: "explorer", run_id = %run.id, reason = %reason.message(), "exploration ended")
            }
        }

        let document = {
            let mut ctx = self.context.lock();
            if ctx.generation == generation {
                ctx.reset()
            } else {
                None
            }
        };
        if let Some(document) = document {
            self.close_document(&document).await;
        }
        metrics::record_run_finished(status.as_str());
        self.idle.send_replace(true);
    }

    async fn close_document(&self, document: &DocumentId) {
        if let Err(err) = self.primitives.navigator.close(document).await {
            debug!(target: "explorer", %err, %document, "closing document failed");
        }
    }
}
