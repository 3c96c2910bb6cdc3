use std::future;
use std::path::PathBuf;
use std::time::Duration;

use action_primitives::validate_url;
use anyhow::{Context, Result};
use clap::Args;
use tokio::{fs, signal};
use tracing::{info, warn};
use webprobe_core_types::TestRun;

use super::context::{launch_explorer, CliContext};
use super::output::{print_run, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ExploreArgs {
    /// Page to start exploring from
    pub url: String,

    /// Identifier stored on the run
    #[arg(long)]
    pub config_id: Option<String>,

    /// Stop the run after this long (e.g. "90s", "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Ask the oracle to validate every recorded page
    #[arg(long)]
    pub validate_pages: bool,

    /// Fail the run after this many consecutive failed iterations
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Skip screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Write the finished run to <output_dir>/<run id>.json
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndedBy {
    Idle,
    Interrupted,
    TimedOut,
}

pub async fn cmd_explore(args: ExploreArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    validate_url(&args.url).with_context(|| format!("cannot explore {}", args.url))?;

    let mut config = ctx.config().clone();
    if args.headful {
        config.browser.headless = false;
    }
    if args.validate_pages {
        config.explorer.validate_pages = true;
    }
    if let Some(max) = args.max_retries {
        config.explorer.max_transient_retries = Some(max);
    }
    if args.no_screenshots {
        config.explorer.capture_screenshots = false;
    }

    let handle = launch_explorer(&config).await?;
    let orchestrator = handle.orchestrator.clone();
    let run_id = match orchestrator.start_test(&args.url, args.config_id.clone()).await {
        Ok(run_id) => run_id,
        Err(err) => {
            handle.shutdown().await;
            return Err(err).context("starting exploration");
        }
    };
    info!(run_id = %run_id, url = %args.url, "exploring");

    let deadline = async {
        match args.timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => future::pending::<()>().await,
        }
    };
    let ended_by = tokio::select! {
        _ = orchestrator.wait_until_idle() => EndedBy::Idle,
        _ = signal::ctrl_c() => EndedBy::Interrupted,
        _ = deadline => EndedBy::TimedOut,
    };
    if ended_by != EndedBy::Idle {
        warn!(?ended_by, "stopping exploration before it converged");
    }

    let run = match orchestrator.stop_test().await {
        Some(run) => Some(run),
        None => orchestrator.status().current_run,
    };
    let logs = orchestrator.recent_logs();
    handle.shutdown().await;
    log_session_counters();

    let Some(run) = run else {
        anyhow::bail!("run {} disappeared before it could be reported", run_id);
    };
    print_run(&run, &logs, &output)?;
    if args.save {
        let path = save_run(&config.output_dir, &run).await?;
        println!("Saved run to {}", path.display());
    }
    Ok(())
}

fn log_session_counters() {
    let explorer = agent_core::metrics::snapshot();
    let cdp = cdp_adapter::metrics::snapshot();
    info!(
        iterations = explorer.iterations,
        oracle_requests = explorer.oracle_requests,
        oracle_failures = explorer.oracle_failures,
        issues = explorer.issues,
        dropped_triggers = explorer.guard_rejections,
        cdp_commands = cdp.commands,
        cdp_failures = cdp.command_failures,
        page_events = cdp.events,
        "exploration counters"
    );
}

async fn save_run(dir: &std::path::Path, run: &TestRun) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.json", run.id));
    let body = serde_json::to_vec_pretty(run)?;
    fs::write(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
