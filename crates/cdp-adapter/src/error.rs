use action_primitives::ActionError;
use thiserror::Error;

/// Failures surfaced by the Chromium backend.
#[derive(Clone, Debug, Error)]
pub enum CdpAdapterError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("cdp i/o failure: {0}")]
    CdpIo(String),
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("unexpected payload: {0}")]
    Payload(String),
    #[error("invalid command parameters: {0}")]
    InvalidParams(String),
}

impl From<chromiumoxide::error::CdpError> for CdpAdapterError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CdpAdapterError::CdpIo(err.to_string())
    }
}

impl From<CdpAdapterError> for ActionError {
    fn from(err: CdpAdapterError) -> Self {
        match err {
            CdpAdapterError::DocumentNotFound(doc) => ActionError::DocumentNotFound(doc),
            CdpAdapterError::Script(msg) | CdpAdapterError::Payload(msg) => {
                ActionError::ExtractionFailed(msg)
            }
            CdpAdapterError::CdpIo(msg) => ActionError::CdpIo(msg),
            CdpAdapterError::Launch(msg) | CdpAdapterError::InvalidParams(msg) => {
                ActionError::Internal(msg)
            }
        }
    }
}
