use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{IssueId, RunId, StepId};

/// Raised when a textual enum value (from the oracle or a config file) is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of action a step records. Only `Navigate` is emitted today.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Navigate,
    Click,
    Type,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ConsoleError,
    NetworkError,
    BlankScreen,
    UiAnomaly,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ConsoleError => "console_error",
            IssueKind::NetworkError => "network_error",
            IssueKind::BlankScreen => "blank_screen",
            IssueKind::UiAnomaly => "ui_anomaly",
        }
    }
}

impl FromStr for IssueKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console_error" => Ok(IssueKind::ConsoleError),
            "network_error" => Ok(IssueKind::NetworkError),
            "blank_screen" => Ok(IssueKind::BlankScreen),
            "ui_anomaly" => Ok(IssueKind::UiAnomaly),
            _ => Err(UnknownVariant {
                kind: "issue kind",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Low => "low",
            IssueSeverity::Medium => "medium",
            IssueSeverity::High => "high",
            IssueSeverity::Critical => "critical",
        }
    }
}

impl FromStr for IssueSeverity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(IssueSeverity::Low),
            "medium" => Ok(IssueSeverity::Medium),
            "high" => Ok(IssueSeverity::High),
            "critical" => Ok(IssueSeverity::Critical),
            _ => Err(UnknownVariant {
                kind: "issue severity",
                value: s.to_string(),
            }),
        }
    }
}

/// Outcome of one loop iteration. Never mutated once appended to a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub id: StepId,
    pub run_id: RunId,
    pub sequence: u32,
    pub action: StepAction,
    /// URL visited by this step.
    pub target: String,
    /// Page title at the time of the step.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

impl TestStep {
    pub fn navigate(
        run_id: RunId,
        sequence: u32,
        target: impl Into<String>,
        description: impl Into<String>,
        screenshot: Option<String>,
    ) -> Self {
        Self {
            id: StepId::new(),
            run_id,
            sequence,
            action: StepAction::Navigate,
            target: target.into(),
            description: description.into(),
            screenshot,
            timestamp: Utc::now(),
            success: true,
        }
    }
}

/// Anomaly observed while recording a step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedIssue {
    pub id: IssueId,
    pub run_id: RunId,
    pub step_id: StepId,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_errors: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl DetectedIssue {
    pub fn new(
        run_id: RunId,
        step_id: StepId,
        kind: IssueKind,
        severity: IssueSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: IssueId::new(),
            run_id,
            step_id,
            kind,
            severity,
            title: title.into(),
            description: description.into(),
            screenshots: Vec::new(),
            console_errors: None,
            network_errors: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_screenshot(mut self, screenshot: Option<String>) -> Self {
        if let Some(shot) = screenshot {
            self.screenshots.push(shot);
        }
        self
    }

    pub fn with_console_errors(mut self, errors: Vec<String>) -> Self {
        self.console_errors = Some(errors);
        self
    }

    pub fn with_network_errors(mut self, errors: Vec<String>) -> Self {
        self.network_errors = Some(errors);
        self
    }
}

/// One exploration session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: RunId,
    /// Tag identifying the user the run belongs to.
    pub user_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    pub status: RunStatus,
    pub start_url: String,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(default)]
    pub issues: Vec<DetectedIssue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TestRun {
    pub fn new(
        start_url: impl Into<String>,
        user_tag: impl Into<String>,
        config_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::new(),
            user_tag: user_tag.into(),
            config_id,
            status: RunStatus::Running,
            start_url: start_url.into(),
            steps: Vec::new(),
            issues: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Sequence number the next appended step will carry.
    pub fn next_sequence(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    pub fn push_step(&mut self, step: TestStep) {
        self.steps.push(step);
        self.updated_at = Utc::now();
    }

    pub fn push_issue(&mut self, issue: DetectedIssue) {
        self.issues.push(issue);
        self.updated_at = Utc::now();
    }

    /// Freeze the run with a terminal status. No-op once already terminal.
    pub fn finish(&mut self, status: RunStatus) {
        if !self.is_running() {
            return;
        }
        let now = Utc::now();
        self.status = status;
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}
