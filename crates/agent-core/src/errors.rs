use action_primitives::ActionError;
use thiserror::Error;

/// Errors raised while talking to the decision oracle.
#[derive(Debug, Error, Clone)]
pub enum OracleError {
    /// The request never produced an HTTP response.
    #[error("oracle transport failed: {0}")]
    Transport(String),

    /// The outbound policy refused the destination.
    #[error("outbound call to {0} blocked by policy")]
    Blocked(String),

    /// Non-2xx status from the oracle.
    #[error("oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected envelope.
    #[error("oracle response invalid: {0}")]
    Decode(String),

    /// Envelope carried no success indicator.
    #[error("oracle response missing success indicator")]
    MissingSuccess,

    /// Envelope reported `success: false`.
    #[error("oracle rejected request: {0}")]
    Rejected(String),

    /// Client could not be constructed from its configuration.
    #[error("invalid oracle configuration: {0}")]
    Config(String),
}

impl OracleError {
    /// Helper for configuration failures.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OracleError::Transport(_) => "transport",
            OracleError::Blocked(_) => "blocked",
            OracleError::Status { .. } => "status",
            OracleError::Decode(_) => "decode",
            OracleError::MissingSuccess => "missing_success",
            OracleError::Rejected(_) => "rejected",
            OracleError::Config(_) => "config",
        }
    }
}

/// Errors surfaced by the exploration orchestrator to its caller.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Opening the target document failed; no run was created.
    #[error("failed to open document: {0}")]
    DocumentOpen(#[source] ActionError),
}
