//! In-memory holder of the active run, the last finished run and a rolling
//! log of user-facing messages.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use webprobe_core_types::{DetectedIssue, RunStatus, TestRun, TestStep};

/// Number of log entries retained; older entries are dropped first.
pub const MAX_LOG_ENTRIES: usize = 50;

/// Identifies which `start_test` call a write belongs to. Writers holding a
/// stale generation are ignored.
pub type RunGeneration = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Default)]
struct StoreInner {
    active: Option<TestRun>,
    last: Option<TestRun>,
    generation: RunGeneration,
    logs: VecDeque<LogEntry>,
}

impl StoreInner {
    fn writable(&mut self, generation: RunGeneration) -> Option<&mut TestRun> {
        if self.generation != generation {
            return None;
        }
        self.active.as_mut().filter(|run| run.is_running())
    }
}

#[derive(Default)]
pub struct RunRecordStore {
    inner: Mutex<StoreInner>,
}

impl RunRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `run` as the active run and returns its generation. A run
    /// that was still active is discarded without being finished.
    pub fn begin(&self, run: TestRun) -> RunGeneration {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.active = Some(run);
        inner.generation
    }

    pub fn generation(&self) -> RunGeneration {
        self.inner.lock().generation
    }

    /// Whether `generation` still owns a running run.
    pub fn is_active(&self, generation: RunGeneration) -> bool {
        self.inner.lock().writable(generation).is_some()
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .active
            .as_ref()
            .map(TestRun::is_running)
            .unwrap_or(false)
    }

    /// Finishes whichever run is active. Returns the frozen snapshot.
    pub fn finish(&self, status: RunStatus) -> Option<TestRun> {
        Self::finish_locked(&mut self.inner.lock(), status)
    }

    /// Finishes the active run only if it still belongs to `generation`.
    pub fn finish_if(&self, generation: RunGeneration, status: RunStatus) -> Option<TestRun> {
        let mut inner = self.inner.lock();
        inner.writable(generation)?;
        Self::finish_locked(&mut inner, status)
    }

    fn finish_locked(inner: &mut StoreInner, status: RunStatus) -> Option<TestRun> {
        let mut run = inner.active.take()?;
        run.finish(status);
        inner.last = Some(run.clone());
        Some(run)
    }

    /// Appends a step built from the current run state. The builder only
    /// runs when the write is accepted.
    pub fn append_step<F>(&self, generation: RunGeneration, build: F) -> Option<TestStep>
    where
        F: FnOnce(&TestRun) -> TestStep,
    {
        let mut inner = self.inner.lock();
        let run = inner.writable(generation)?;
        let step = build(run);
        run.push_step(step.clone());
        Some(step)
    }

    pub fn append_issue(&self, generation: RunGeneration, issue: DetectedIssue) -> bool {
        let mut inner = self.inner.lock();
        match inner.writable(generation) {
            Some(run) => {
                run.push_issue(issue);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<TestRun> {
        self.inner.lock().active.clone()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<TestRun> {
        self.inner.lock().last.clone()
    }

    /// The active run, or the most recently finished one.
    pub fn current_or_last(&self) -> Option<TestRun> {
        let inner = self.inner.lock();
        inner.active.clone().or_else(|| inner.last.clone())
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        if inner.logs.len() == MAX_LOG_ENTRIES {
            inner.logs.pop_front();
        }
        inner.logs.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
    }

    /// Oldest first.
    pub fn recent_logs(&self) -> Vec<LogEntry> {
        self.inner.lock().logs.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webprobe_core_types::{IssueKind, IssueSeverity};

    fn step(run: &TestRun) -> TestStep {
        TestStep::navigate(run.id.clone(), run.next_sequence(), "https://a.test/", "A", None)
    }

    #[test]
    fn appends_follow_the_owning_generation() {
        let store = RunRecordStore::new();
        let first = store.begin(TestRun::new("https://a.test", "u", None));
        assert!(store.append_step(first, step).is_some());

        let second = store.begin(TestRun::new("https://b.test", "u", None));
        assert!(store.append_step(first, step).is_none());
        let appended = store.append_step(second, step).unwrap();
        assert_eq!(appended.sequence, 1);
        assert_eq!(store.active().unwrap().start_url, "https://b.test");
    }

    #[test]
    fn finished_runs_reject_late_writes() {
        let store = RunRecordStore::new();
        let generation = store.begin(TestRun::new("https://a.test", "u", None));
        let step = store.append_step(generation, step).unwrap();

        let finished = store.finish(RunStatus::Completed).unwrap();
        assert_eq!(finished.status, RunStatus::Completed);
        assert!(finished.completed_at.is_some());

        let issue = DetectedIssue::new(
            finished.id.clone(),
            step.id,
            IssueKind::ConsoleError,
            IssueSeverity::High,
            "late",
            "late",
        );
        assert!(!store.append_issue(generation, issue));
        assert!(!store.is_active(generation));
        assert!(store.finish(RunStatus::Completed).is_none());
        assert_eq!(store.last().unwrap().steps.len(), 1);
        assert_eq!(store.current_or_last().unwrap().id, finished.id);
    }

    #[test]
    fn finish_if_ignores_stale_generation() {
        let store = RunRecordStore::new();
        let stale = store.begin(TestRun::new("https://a.test", "u", None));
        let current = store.begin(TestRun::new("https://b.test", "u", None));
        assert!(store.finish_if(stale, RunStatus::Failed).is_none());
        assert!(store.is_active(current));
        let run = store.finish_if(current, RunStatus::Failed).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[test]
    fn log_keeps_only_the_newest_entries() {
        let store = RunRecordStore::new();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            store.log(LogLevel::Info, format!("entry {i}"));
        }
        let logs = store.recent_logs();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
        assert_eq!(logs.last().unwrap().message, format!("entry {}", MAX_LOG_ENTRIES + 4));
    }
}
