mod app;
pub mod commands;
pub mod config;
pub mod context;
mod dispatch;
pub mod env;
pub mod explore;
mod info;
pub mod output;
pub mod runtime;
pub mod serve;

pub use app::run;
pub use explore::{cmd_explore, ExploreArgs};
pub use serve::{cmd_serve, ServeArgs};
