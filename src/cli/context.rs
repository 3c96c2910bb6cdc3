use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_primitives::PrimitiveSet;
use agent_core::{DecisionOracle, ExplorationOrchestrator, HttpOracleClient};
use anyhow::{Context, Result};
use cdp_adapter::ChromiumSession;
use tracing::info;

use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
    metrics_port: u16,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, metrics_port: u16) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            metrics_port,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }
}

/// A browser session plus the orchestrator driving it.
pub struct ExplorerHandle {
    pub orchestrator: ExplorationOrchestrator,
    pub session: Arc<ChromiumSession>,
}

impl ExplorerHandle {
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

/// Launches Chromium and wires it to the HTTP oracle client.
pub async fn launch_explorer(config: &AppConfig) -> Result<ExplorerHandle> {
    config.validate()?;
    let oracle = HttpOracleClient::from_config(config.oracle.clone(), config.outbound_policy())
        .context("building oracle client")?;
    let session = Arc::new(
        ChromiumSession::launch(config.browser.clone())
            .await
            .context("launching Chromium")?,
    );
    info!(
        oracle = %config.oracle.base_url,
        headless = config.browser.headless,
        "explorer ready"
    );

    let oracle: Arc<dyn DecisionOracle> = Arc::new(oracle);
    let orchestrator = ExplorationOrchestrator::new(
        config.explorer.clone(),
        PrimitiveSet::from_backend(session.clone()),
        oracle,
    );
    Ok(ExplorerHandle {
        orchestrator,
        session,
    })
}
