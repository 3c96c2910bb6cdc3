use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::OracleError;
use crate::metrics;
use crate::oracle::menu::{format_menu, Candidate};
use crate::oracle::policy::OutboundPolicy;
use crate::oracle::transport::{GuardedTransport, HttpTransport, OracleTransport};
use crate::oracle::wire::{
    Envelope, PageValidation, PageValidationRequest, PickElementData, PickElementRequest,
};
use crate::oracle::DecisionOracle;

pub const PICK_ELEMENT_PATH: &str = "/ai/pick-element";
pub const VALIDATE_PAGE_PATH: &str = "/ai/validate-page";

/// Connection settings for the oracle service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_prefix: "/api/v1".to_string(),
            api_key: None,
            timeout_ms: 30_000,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{base}{prefix}{path}` with redundant slashes collapsed at the joins.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}/{prefix}{path}")
        }
    }
}

/// Oracle client speaking the HTTP envelope protocol.
pub struct HttpOracleClient {
    transport: Arc<dyn OracleTransport>,
    config: OracleConfig,
}

impl HttpOracleClient {
    /// Builds a reqwest transport guarded by `policy`.
    pub fn from_config(config: OracleConfig, policy: OutboundPolicy) -> Result<Self, OracleError> {
        if config.base_url.trim().is_empty() {
            return Err(OracleError::config("oracle base_url is empty"));
        }
        let http = HttpTransport::new(config.timeout(), config.api_key.clone())?;
        let guarded = GuardedTransport::new(Arc::new(http), policy);
        Ok(Self::with_transport(config, Arc::new(guarded)))
    }

    pub fn with_transport(config: OracleConfig, transport: Arc<dyn OracleTransport>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        body: Value,
    ) -> Result<Option<T>, OracleError> {
        let url = self.config.endpoint(path);
        metrics::record_oracle_request(endpoint);
        let result = self.exchange(&url, &body).await;
        if let Err(err) = &result {
            metrics::record_oracle_failure(endpoint, err.label());
        }
        result
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<Option<T>, OracleError> {
        let response = self.transport.post_json(url, body).await?;
        debug!(target: "oracle", %url, status = response.status, "oracle responded");
        if !response.is_success() {
            return Err(OracleError::Status {
                status: response.status,
                body: response.body,
            });
        }
        let envelope: Envelope<T> = serde_json::from_str(&response.body)
            .map_err(|err| OracleError::Decode(err.to_string()))?;
        match envelope.success {
            None => Err(OracleError::MissingSuccess),
            Some(false) => Err(OracleError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| "no error message".to_string()),
            )),
            Some(true) => Ok(envelope.data),
        }
    }
}

#[async_trait]
impl DecisionOracle for HttpOracleClient {
    async fn pick_element(
        &self,
        candidates: &[Candidate],
        page_url: &str,
        page_title: &str,
    ) -> Result<Option<i64>, OracleError> {
        let request = PickElementRequest {
            url: page_url,
            title: page_title,
            elements: format_menu(candidates),
        };
        let body =
            serde_json::to_value(&request).map_err(|err| OracleError::Decode(err.to_string()))?;
        let data: Option<PickElementData> =
            self.call("pick_element", PICK_ELEMENT_PATH, body).await?;
        Ok(data.and_then(|data| data.selected_index))
    }

    async fn validate_page(
        &self,
        request: &PageValidationRequest,
    ) -> Result<PageValidation, OracleError> {
        let body =
            serde_json::to_value(request).map_err(|err| OracleError::Decode(err.to_string()))?;
        let data: Option<PageValidation> =
            self.call("validate_page", VALIDATE_PAGE_PATH, body).await?;
        Ok(data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_prefix_and_path() {
        let config = OracleConfig {
            base_url: "http://oracle:8000/".into(),
            api_prefix: "/api/v1/".into(),
            ..OracleConfig::default()
        };
        assert_eq!(
            config.endpoint(PICK_ELEMENT_PATH),
            "http://oracle:8000/api/v1/ai/pick-element"
        );

        let bare = OracleConfig {
            api_prefix: String::new(),
            ..config
        };
        assert_eq!(
            bare.endpoint(VALIDATE_PAGE_PATH),
            "http://oracle:8000/ai/validate-page"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = OracleConfig {
            base_url: " ".into(),
            ..OracleConfig::default()
        };
        let err = HttpOracleClient::from_config(config, OutboundPolicy::permissive())
            .err()
            .unwrap();
        assert!(matches!(err, OracleError::Config(_)));
    }
}
