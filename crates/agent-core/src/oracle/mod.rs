//! Decision oracle: chooses the next element and optionally judges pages.

mod client;
mod menu;
mod policy;
mod transport;
mod wire;

use async_trait::async_trait;

use crate::errors::OracleError;

pub use client::{HttpOracleClient, OracleConfig, PICK_ELEMENT_PATH, VALIDATE_PAGE_PATH};
pub use menu::{format_candidate, format_menu, Candidate};
pub use policy::OutboundPolicy;
pub use transport::{GuardedTransport, HttpTransport, OracleTransport, TransportResponse};
pub use wire::{PageValidation, PageValidationRequest, ValidationIssue};

#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Returns the index of the chosen candidate, or `None` when the oracle
    /// made no selection. Indexes refer to the candidates' `index` field,
    /// which the caller bounds-checks positionally.
    async fn pick_element(
        &self,
        candidates: &[Candidate],
        page_url: &str,
        page_title: &str,
    ) -> Result<Option<i64>, OracleError>;

    async fn validate_page(
        &self,
        request: &PageValidationRequest,
    ) -> Result<PageValidation, OracleError>;
}
