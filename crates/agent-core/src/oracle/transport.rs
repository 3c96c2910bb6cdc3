use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::errors::OracleError;
use crate::oracle::policy::OutboundPolicy;

/// Raw HTTP outcome handed back to the oracle client.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the oracle client and the network.
#[async_trait]
pub trait OracleTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, OracleError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OracleError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait]
impl OracleTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, OracleError> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Wraps a transport and refuses destinations outside the policy.
pub struct GuardedTransport {
    inner: Arc<dyn OracleTransport>,
    policy: OutboundPolicy,
}

impl GuardedTransport {
    pub fn new(inner: Arc<dyn OracleTransport>, policy: OutboundPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &OutboundPolicy {
        &self.policy
    }
}

#[async_trait]
impl OracleTransport for GuardedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, OracleError> {
        if !self.policy.permits(url) {
            warn!(target: "oracle", %url, "outbound request blocked");
            return Err(OracleError::Blocked(url.to_string()));
        }
        self.inner.post_json(url, body).await
    }
}
