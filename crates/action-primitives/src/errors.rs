//! Error types for action primitives

use thiserror::Error;

/// Failures reported by navigator, extractor, injector and capture implementations
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Document did not reach load-complete before the deadline
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Target URL was rejected before any navigation happened
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Document handle is unknown or was closed
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Extraction capability is not reachable in the document context
    #[error("Extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    /// Extraction ran but did not produce a usable report
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Pointer sequence could not be dispatched
    #[error("Injection failed: {0}")]
    InjectionFailed(String),

    /// Snapshot could not be taken
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Operation was cancelled or interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Whether the explorer should back off and re-enter the loop on this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::NavTimeout(_)
                | ActionError::ExtractorUnavailable(_)
                | ActionError::ExtractionFailed(_)
                | ActionError::CdpIo(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) | ActionError::DocumentNotFound(_) => 3,
            ActionError::InvalidUrl(_)
            | ActionError::InjectionFailed(_)
            | ActionError::CdpIo(_) => 2,
            ActionError::NavTimeout(_)
            | ActionError::ExtractorUnavailable(_)
            | ActionError::ExtractionFailed(_) => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_errors_are_retryable() {
        assert!(ActionError::ExtractorUnavailable("ping".into()).is_retryable());
        assert!(ActionError::ExtractionFailed("bad payload".into()).is_retryable());
        assert!(!ActionError::InjectionFailed("detached".into()).is_retryable());
        assert!(!ActionError::InvalidUrl("ftp://x".into()).is_retryable());
    }

    #[test]
    fn severity_ranks_internal_highest() {
        assert_eq!(ActionError::Internal("x".into()).severity(), 3);
        assert_eq!(ActionError::CaptureFailed("x".into()).severity(), 0);
    }
}
