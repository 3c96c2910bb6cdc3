use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::context::{launch_explorer, CliContext};
use crate::server::{build_router, ServeState};

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port for the control server
    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    if args.headful {
        config.browser.headless = false;
    }

    let handle = launch_explorer(&config).await?;
    let state = ServeState::new(handle.orchestrator.clone());
    state.health.mark_live();
    crate::metrics::register_metrics();
    let router = build_router(state.clone());

    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control server on {}", addr))?;
    state.health.mark_ready();
    info!("Control API available at http://{}/api/test", addr);
    info!("Server starting, waiting for requests...");

    let served = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await;

    if let Some(run) = handle.orchestrator.stop_test().await {
        info!(run_id = %run.id, steps = run.steps.len(), "stopped active run on shutdown");
    }
    handle.shutdown().await;
    served.context("control server exited unexpectedly")?;
    Ok(())
}
