//! Exploration kernel.
//!
//! Hosts the orchestrator that walks a document element by element, the
//! client for the decision oracle that picks the next element, and the
//! in-memory store holding the run being recorded.

pub mod errors;
pub mod explorer;
pub mod metrics;
pub mod oracle;
pub mod record_store;

pub use errors::{ExplorerError, OracleError};
pub use explorer::{
    ExplorationContext, ExplorationOrchestrator, ExplorerConfig, FinishReason, IterationGuard,
    StatusSnapshot,
};
pub use oracle::{
    format_menu, Candidate, DecisionOracle, GuardedTransport, HttpOracleClient, HttpTransport,
    OracleConfig, OracleTransport, OutboundPolicy, PageValidation, PageValidationRequest,
    TransportResponse, ValidationIssue,
};
pub use record_store::{LogEntry, LogLevel, RunGeneration, RunRecordStore, MAX_LOG_ENTRIES};
