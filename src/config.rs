//! Application configuration.
//!
//! Loaded from YAML (see `cli::runtime::load_config`), then adjusted by
//! `WEBPROBE_*` environment variables.

use std::env;
use std::path::PathBuf;

use agent_core::{ExplorerConfig, OracleConfig, OutboundPolicy};
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::WebprobeError;

pub const ORACLE_URL_ENV: &str = "WEBPROBE_ORACLE_URL";
pub const ORACLE_API_KEY_ENV: &str = "WEBPROBE_ORACLE_API_KEY";
pub const ORACLE_PREFIX_ENV: &str = "WEBPROBE_ORACLE_PREFIX";
pub const OUTPUT_DIR_ENV: &str = "WEBPROBE_OUTPUT_DIR";
pub const HEADLESS_ENV: &str = "WEBPROBE_HEADLESS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub explorer: ExplorerConfig,
    pub browser: CdpConfig,
    pub outbound: OutboundConfig,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            explorer: ExplorerConfig::default(),
            browser: CdpConfig::default(),
            outbound: OutboundConfig::default(),
            output_dir: PathBuf::from("./webprobe-output"),
        }
    }
}

/// Destinations the oracle client may call besides the oracle's own origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Origins or host patterns (`*.example.com`).
    pub allowed_origins: Vec<String>,
    /// Disable the allow-list entirely.
    pub allow_any: bool,
}

impl AppConfig {
    /// Applies `WEBPROBE_*` overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env(ORACLE_URL_ENV) {
            info!(%url, "oracle base URL overridden from environment");
            self.oracle.base_url = url;
        }
        if let Some(key) = non_empty_env(ORACLE_API_KEY_ENV) {
            self.oracle.api_key = Some(key);
        }
        if let Ok(prefix) = env::var(ORACLE_PREFIX_ENV) {
            self.oracle.api_prefix = prefix.trim().to_string();
        }
        if let Some(dir) = non_empty_env(OUTPUT_DIR_ENV) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = non_empty_env(HEADLESS_ENV) {
            let lower = raw.to_ascii_lowercase();
            self.browser.headless = !matches!(lower.as_str(), "0" | "false" | "no" | "off");
        }
    }

    /// Policy for outbound oracle traffic.
    pub fn outbound_policy(&self) -> OutboundPolicy {
        if self.outbound.allow_any {
            return OutboundPolicy::permissive();
        }
        OutboundPolicy::allowing_origin_of(&self.oracle.base_url)
            .with_patterns(self.outbound.allowed_origins.iter().cloned())
    }

    pub fn validate(&self) -> Result<(), WebprobeError> {
        let base = self.oracle.base_url.trim();
        if base.is_empty() {
            return Err(WebprobeError::config("oracle.base_url must not be empty"));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(WebprobeError::config(format!(
                "oracle.base_url must be an http(s) URL, got {base}"
            )));
        }
        if self.oracle.timeout_ms == 0 {
            return Err(WebprobeError::config("oracle.timeout_ms must be positive"));
        }
        self.explorer
            .validate()
            .map_err(|err| WebprobeError::config(format!("explorer: {err}")))?;
        if !self.outbound_policy().permits(base) {
            return Err(WebprobeError::config(
                "outbound policy does not admit the oracle origin",
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            ORACLE_URL_ENV,
            ORACLE_API_KEY_ENV,
            ORACLE_PREFIX_ENV,
            OUTPUT_DIR_ENV,
            HEADLESS_ENV,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn partial_yaml_falls_back_to_defaults() {
        clear_env();
        let config: AppConfig = serde_yaml::from_str(
            "oracle:\n  base_url: https://oracle.internal\nexplorer:\n  settle_delay_ms: 500\n",
        )
        .unwrap();
        assert_eq!(config.oracle.base_url, "https://oracle.internal");
        assert_eq!(config.oracle.api_prefix, "/api/v1");
        assert_eq!(config.explorer.settle_delay_ms, 500);
        assert_eq!(config.explorer.max_same_page_iterations, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn env_overrides_win_over_file_values() {
        clear_env();
        env::set_var(ORACLE_URL_ENV, "http://10.0.0.5:9000");
        env::set_var(ORACLE_API_KEY_ENV, "k-123");
        env::set_var(HEADLESS_ENV, "off");
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.oracle.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.oracle.api_key.as_deref(), Some("k-123"));
        assert!(!config.browser.headless);
    }

    #[test]
    #[serial]
    fn policy_admits_oracle_and_listed_origins() {
        clear_env();
        let mut config = AppConfig::default();
        config.oracle.base_url = "http://127.0.0.1:8000".into();
        config.outbound.allowed_origins = vec!["https://backup.oracle.test".into()];
        let policy = config.outbound_policy();
        assert!(policy.permits("http://127.0.0.1:8000/api/v1/ai/pick-element"));
        assert!(policy.permits("https://backup.oracle.test/api/v1/ai/pick-element"));
        assert!(!policy.permits("https://elsewhere.test/"));
    }

    #[test]
    #[serial]
    fn invalid_oracle_url_fails_validation() {
        clear_env();
        let mut config = AppConfig::default();
        config.oracle.base_url = "oracle.internal".into();
        assert!(matches!(config.validate(), Err(WebprobeError::Config(_))));
    }
}
