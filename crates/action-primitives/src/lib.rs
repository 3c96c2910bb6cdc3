//! Action primitives consumed by the webprobe explorer.
//!
//! The explorer never talks to a browser directly. It drives four
//! collaborators through the traits in this crate:
//! - [`Navigator`] opens documents and reports load completion
//! - [`Extractor`] lists interactive elements plus captured errors
//! - [`InputInjector`] performs trusted pointer interactions
//! - [`VisualCapture`] snapshots the current view
//!
//! Browser-backed implementations live in `cdp-adapter`; tests use scripted
//! in-memory fakes.

pub mod errors;
mod pointer;
mod primitives;
mod waiting;

pub use errors::*;
pub use pointer::*;
pub use primitives::*;
pub use waiting::*;
