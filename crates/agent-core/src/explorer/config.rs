//! Tunables of the exploration loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one orchestrator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Upper bound on the wait for document load-complete. Exploration
    /// proceeds once it elapses.
    /// Default: 15000
    pub load_timeout_ms: u64,

    /// Delay before re-entering the loop after a transient failure.
    /// Default: 1000
    pub retry_backoff_ms: u64,

    /// Wait after an interaction for navigation or DOM mutation to settle.
    /// Default: 2000
    pub settle_delay_ms: u64,

    /// Pause between pointer events of one interaction.
    /// Default: 100
    pub pointer_dwell_ms: u64,

    /// Consecutive repeat iterations on the same normalized URL before the
    /// run is considered stuck. The first visit to a URL does not count, so
    /// the run ends on the extraction after the limit is reached: with the
    /// default it records 10 steps on the page and stops on the 11th
    /// extraction.
    /// Default: 10
    pub max_same_page_iterations: u32,

    /// Consecutive transient failures tolerated before the run is marked
    /// failed. `None` retries forever.
    /// Default: None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_transient_retries: Option<u32>,

    /// Ask the oracle to judge every recorded page.
    /// Default: false
    pub validate_pages: bool,

    /// Attach a visual capture to every step.
    /// Default: true
    pub capture_screenshots: bool,

    /// Owner tag stamped on created runs.
    /// Default: "local"
    pub user_tag: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 15_000,
            retry_backoff_ms: 1_000,
            settle_delay_ms: 2_000,
            pointer_dwell_ms: 100,
            max_same_page_iterations: 10,
            max_transient_retries: None,
            validate_pages: false,
            capture_screenshots: true,
            user_tag: "local".to_string(),
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Near-zero delays, for tests and scripted backends.
    pub fn fast() -> Self {
        Self {
            load_timeout_ms: 50,
            retry_backoff_ms: 1,
            settle_delay_ms: 1,
            pointer_dwell_ms: 0,
            ..Self::default()
        }
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn pointer_dwell(&self) -> Duration {
        Duration::from_millis(self.pointer_dwell_ms)
    }

    /// Builder: bound transient retries.
    pub fn max_transient_retries(mut self, limit: u32) -> Self {
        self.max_transient_retries = Some(limit);
        self
    }

    /// Builder: toggle oracle page validation.
    pub fn validate_pages(mut self, enabled: bool) -> Self {
        self.validate_pages = enabled;
        self
    }

    /// Builder: toggle screenshots.
    pub fn capture_screenshots(mut self, enabled: bool) -> Self {
        self.capture_screenshots = enabled;
        self
    }

    pub fn user_tag(mut self, tag: impl Into<String>) -> Self {
        self.user_tag = tag.into();
        self
    }

    /// Checks values that would stall or break the loop.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_same_page_iterations == 0 {
            return Err("max_same_page_iterations must be at least 1".to_string());
        }
        if self.load_timeout_ms == 0 {
            return Err("load_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}
