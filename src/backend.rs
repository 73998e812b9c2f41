//! Client for the analysis backend's EDINET endpoints.
//!
//! Two read-only calls feed the rest of the crate: `/edinet/list` returns
//! raw filing records for [`crate::filings`], `/edinet/parse` returns the
//! parsed PL/BS/CF sections the statement engine turns into rows.

use crate::config::ReportConfig;
use crate::error::{FilingError, ValidationError};
use crate::export::transport::upstream_message;
use crate::filings::{FilingQuery, FilingSummary};
use crate::statement::ParsedFiling;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const LIST_PATH: &str = "/edinet/list";
pub const PARSE_PATH: &str = "/edinet/parse";

/// Authenticated client for the backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    config: ReportConfig,
}

impl BackendClient {
    pub fn new(config: &ReportConfig) -> Result<Self, FilingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FilingError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// URL of the list endpoint for `query`.
    pub fn list_url(&self, query: &FilingQuery) -> Result<Url, FilingError> {
        Url::parse_with_params(&self.config.endpoint(LIST_PATH), query.query_pairs())
            .map_err(|e| FilingError::InvalidConfig(format!("bad backend URL: {e}")))
    }

    /// URL of the parse endpoint for one document.
    pub fn parse_url(&self, document_id: &str) -> Result<Url, FilingError> {
        Url::parse_with_params(
            &self.config.endpoint(PARSE_PATH),
            [("document_id", document_id)],
        )
        .map_err(|e| FilingError::InvalidConfig(format!("bad backend URL: {e}")))
    }

    /// Fetch and parse one filing.
    pub async fn parse_document(&self, document_id: &str) -> Result<ParsedFiling, FilingError> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(ValidationError::EmptyDocumentId.into());
        }
        let body = self.get(self.parse_url(document_id)?).await?;
        parsed_from_json(&body)
    }

    /// List the filings matching `query`, in the order the backend returns.
    pub async fn list_filings(&self, query: &FilingQuery) -> Result<Vec<FilingSummary>, FilingError> {
        let body = self.get(self.list_url(query)?).await?;
        let filings = filings_from_json(&body)?;
        info!("Listed {} filing(s) for {}", filings.len(), query.edinet_code);
        Ok(filings)
    }

    async fn get(&self, url: Url) -> Result<Value, FilingError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.config.api_user, Some(&self.config.api_password))
            .send()
            .await
            .map_err(|e| {
                warn!("GET {} failed: {}", url, e);
                FilingError::Transport {
                    detail: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FilingError::Upstream {
                status: status.as_u16(),
                message: upstream_message(status.as_u16(), &body),
            });
        }
        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FilingError::InvalidResponse(e.to_string())
            } else {
                FilingError::Transport {
                    detail: e.to_string(),
                }
            }
        })
    }
}

/// Read the `parsed` field of a parse response; absent or null means an
/// empty filing.
pub fn parsed_from_json(body: &Value) -> Result<ParsedFiling, FilingError> {
    match body.get("parsed") {
        None | Some(Value::Null) => Ok(ParsedFiling::default()),
        Some(parsed @ Value::Object(_)) => ParsedFiling::deserialize(parsed)
            .map_err(|e| FilingError::InvalidResponse(e.to_string())),
        Some(other) => Err(FilingError::InvalidResponse(format!(
            "'parsed' is not an object: {other}"
        ))),
    }
}

/// Read the `filings` array of a list response; absent means none.
pub fn filings_from_json(body: &Value) -> Result<Vec<FilingSummary>, FilingError> {
    match body.get("filings") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().map(FilingSummary::from_json).collect()),
        Some(other) => Err(FilingError::InvalidResponse(format!(
            "'filings' is not an array: {other}"
        ))),
    }
}
