use super::config::cmd_config;
use super::env::CliArgs;
use super::explore::cmd_explore;
use super::info::cmd_info;
use super::serve::cmd_serve;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Explore(args) => cmd_explore(args, ctx, cli.output.clone()).await,
        Commands::Serve(args) => cmd_serve(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
