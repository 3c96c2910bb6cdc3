use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, IntCounterVec, Opts, Registry};
use tracing::error;

/// Process-wide totals, readable without a registry.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplorerMetricsSnapshot {
    pub iterations: u64,
    pub oracle_requests: u64,
    pub oracle_failures: u64,
    pub issues: u64,
    pub guard_rejections: u64,
}

static ITERATIONS: AtomicU64 = AtomicU64::new(0);
static ORACLE_REQUESTS: AtomicU64 = AtomicU64::new(0);
static ORACLE_FAILURES: AtomicU64 = AtomicU64::new(0);
static ISSUES: AtomicU64 = AtomicU64::new(0);
static GUARD_REJECTIONS: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref ITERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "webprobe_explorer_iterations_total",
            "Exploration loop iterations by outcome"
        ),
        &["outcome"]
    )
    .unwrap();
    static ref ORACLE_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("webprobe_oracle_requests_total", "Requests sent to the decision oracle"),
        &["endpoint"]
    )
    .unwrap();
    static ref ORACLE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("webprobe_oracle_failures_total", "Failed decision oracle requests"),
        &["endpoint", "reason"]
    )
    .unwrap();
    static ref ISSUES_RECORDED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("webprobe_issues_recorded_total", "Detected issues appended to runs"),
        &["kind"]
    )
    .unwrap();
    static ref GUARD_REJECTIONS_TOTAL: IntCounter = IntCounter::new(
        "webprobe_explorer_guard_rejections_total",
        "Loop triggers dropped because an iteration was in flight"
    )
    .unwrap();
    static ref RUNS_FINISHED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("webprobe_runs_finished_total", "Runs finished by final status"),
        &["status"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register explorer metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, ITERATIONS_TOTAL.clone());
    register(registry, ORACLE_REQUESTS_TOTAL.clone());
    register(registry, ORACLE_FAILURES_TOTAL.clone());
    register(registry, ISSUES_RECORDED_TOTAL.clone());
    register(registry, GUARD_REJECTIONS_TOTAL.clone());
    register(registry, RUNS_FINISHED_TOTAL.clone());
}

pub fn record_iteration(outcome: &str) {
    ITERATIONS.fetch_add(1, Ordering::Relaxed);
    ITERATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_oracle_request(endpoint: &str) {
    ORACLE_REQUESTS.fetch_add(1, Ordering::Relaxed);
    ORACLE_REQUESTS_TOTAL.with_label_values(&[endpoint]).inc();
}

pub fn record_oracle_failure(endpoint: &str, reason: &str) {
    ORACLE_FAILURES.fetch_add(1, Ordering::Relaxed);
    ORACLE_FAILURES_TOTAL
        .with_label_values(&[endpoint, reason])
        .inc();
}

pub fn record_issue(kind: &str) {
    ISSUES.fetch_add(1, Ordering::Relaxed);
    ISSUES_RECORDED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_guard_rejection() {
    GUARD_REJECTIONS.fetch_add(1, Ordering::Relaxed);
    GUARD_REJECTIONS_TOTAL.inc();
}

pub fn record_run_finished(status: &str) {
    RUNS_FINISHED_TOTAL.with_label_values(&[status]).inc();
}

pub fn snapshot() -> ExplorerMetricsSnapshot {
    ExplorerMetricsSnapshot {
        iterations: ITERATIONS.load(Ordering::Relaxed),
        oracle_requests: ORACLE_REQUESTS.load(Ordering::Relaxed),
        oracle_failures: ORACLE_FAILURES.load(Ordering::Relaxed),
        issues: ISSUES.load(Ordering::Relaxed),
        guard_rejections: GUARD_REJECTIONS.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_twice_is_harmless() {
        let registry = Registry::new();
        register_metrics(&registry);
        register_metrics(&registry);
        record_guard_rejection();
        let names: Vec<_> = registry
            .gather()
            .into_iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"webprobe_explorer_guard_rejections_total".to_string()));
    }

    #[test]
    fn snapshot_tracks_recorded_counters() {
        let before = snapshot();
        record_iteration("continue");
        record_oracle_request("pick_element");
        record_oracle_failure("pick_element", "status");
        record_issue("console_error");
        let after = snapshot();
        assert!(after.iterations > before.iterations);
        assert!(after.oracle_requests > before.oracle_requests);
        assert!(after.oracle_failures > before.oracle_failures);
        assert!(after.issues > before.issues);
    }
}
