//! Request and response bodies of the oracle HTTP API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PickElementRequest<'a> {
    pub url: &'a str,
    pub title: &'a str,
    /// Formatted candidate menu.
    pub elements: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickElementData {
    #[serde(default)]
    pub selected_index: Option<i64>,
}

/// Input of the page-outcome validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageValidationRequest {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub console_errors: Vec<String>,
    #[serde(default)]
    pub network_errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageValidation {
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
}

fn default_valid() -> bool {
    true
}

/// Issue as reported by the oracle. Kind and severity stay textual until
/// the explorer maps them onto its own enums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Shared `{success, data, error}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}
