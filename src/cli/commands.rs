use clap::Subcommand;

use super::config::ConfigArgs;
use super::explore::ExploreArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Explore a page until the oracle runs out of choices or a stop condition fires
    Explore(ExploreArgs),

    /// Run the HTTP control server for an external UI
    Serve(ServeArgs),

    /// Manage webprobe configuration
    Config(ConfigArgs),

    /// Show build information, configuration summary and browser detection
    Info,
}
