//! webprobe: AI-guided exploration of web pages.
//!
//! The library half of the binary. It holds the application config, the
//! HTTP control server and the CLI commands. The exploration engine itself
//! lives in `agent-core`; the Chromium backend in `cdp-adapter`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod server;

pub use config::{AppConfig, OutboundConfig};
pub use errors::{WebprobeError, WebprobeResult};
