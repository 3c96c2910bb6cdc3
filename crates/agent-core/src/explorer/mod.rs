//! Autonomous exploration loop.

mod config;
mod context;
mod guard;
mod orchestrator;

pub use config::ExplorerConfig;
pub use context::ExplorationContext;
pub use guard::IterationGuard;
pub use orchestrator::{ExplorationOrchestrator, FinishReason, StatusSnapshot};
