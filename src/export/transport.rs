//! Report transport: one JSON POST, one raw response.
//!
//! [`ReportTransport`] performs exactly one round
//! trip and reports what came back; interpreting status codes, bodies and
//! headers is the pipeline's job. There is no retry here. A retry policy, if
//! ever needed, wraps a transport as its own `ReportTransport`.

use crate::config::ReportConfig;
use crate::error::FilingError;
use crate::export::idempotency::{IdempotencyKey, IDEMPOTENCY_HEADER};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the service sent back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as (lossy) UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one JSON request to the report service.
pub trait ReportTransport: Send + Sync {
    /// POST `body` (already JSON-encoded) to `path`.
    ///
    /// `Err` only for failures without an HTTP response; every status code,
    /// success or not, comes back as `Ok`.
    fn post_json(
        &self,
        path: &str,
        key: &IdempotencyKey,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<TransportResponse, FilingError>> + Send;
}

/// Human-readable message for a non-success response.
///
/// A JSON body contributes its `detail` or `error` field and otherwise
/// yields `HTTP <status>`. A body that is not JSON is surfaced as raw text,
/// and an empty one becomes `HTTP <status>`.
pub fn upstream_message(status: u16, body: &str) -> String {
    let fallback = || format!("HTTP {status}");
    match serde_json::from_str::<Value>(body) {
        Ok(v) => ["detail", "error"]
            .iter()
            .find_map(|field| v.get(*field).and_then(message_text))
            .unwrap_or_else(fallback),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                fallback()
            } else {
                text.to_string()
            }
        }
    }
}

fn message_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map a non-success response to [`FilingError::Upstream`].
pub fn upstream_error(response: &TransportResponse) -> FilingError {
    FilingError::Upstream {
        status: response.status,
        message: upstream_message(response.status, &response.text()),
    }
}

/// [`ReportTransport`] over HTTP with Basic credentials.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ReportConfig,
}

impl HttpTransport {
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
}

impl ReportTransport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        key: &IdempotencyKey,
        body: Vec<u8>,
    ) -> Result<TransportResponse, FilingError> {
        let url = self.config.endpoint(path);
        info!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.api_user, Some(&self.config.api_password))
            .header(CONTENT_TYPE, "application/json")
            .header(IDEMPOTENCY_HEADER, key.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!("POST {} failed: {}", url, e);
                FilingError::Transport {
                    detail: e.to_string(),
                }
            })?;

        let status = response.status().as_u16();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);

        let body = response
            .bytes()
            .await
            .map_err(|e| FilingError::Transport {
                detail: e.to_string(),
            })?
            .to_vec();
        debug!("{} → HTTP {} ({} bytes)", url, status, body.len());

        Ok(TransportResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_wins() {
        let body = r#"{"detail": "pdf generation failed: boom", "error": "x"}"#;
        assert_eq!(upstream_message(500, body), "pdf generation failed: boom");
    }

    #[test]
    fn error_field_when_no_detail() {
        assert_eq!(
            upstream_message(405, r#"{"error": "Method Not Allowed"}"#),
            "Method Not Allowed"
        );
    }

    #[test]
    fn structured_detail_is_stringified() {
        let body = r#"{"detail": [{"loc": ["body", "to"], "msg": "field required"}]}"#;
        assert!(upstream_message(422, body).contains("field required"));
    }

    #[test]
    fn raw_text_when_not_json() {
        assert_eq!(upstream_message(502, "Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn json_without_message_fields_is_status_line() {
        assert_eq!(upstream_message(500, r#"{"ok": false}"#), "HTTP 500");
        assert_eq!(upstream_message(400, r#"{"detail": ""}"#), "HTTP 400");
        assert_eq!(upstream_message(502, "null"), "HTTP 502");
    }

    #[test]
    fn empty_body_is_status_line() {
        assert_eq!(upstream_message(503, ""), "HTTP 503");
    }

    #[test]
    fn upstream_error_carries_status() {
        let resp = TransportResponse {
            status: 401,
            body: br#"{"detail":"Unauthorized"}"#.to_vec(),
            ..Default::default()
        };
        let err = upstream_error(&resp);
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn http_transport_builds_from_config() {
        assert!(HttpTransport::new(&ReportConfig::default()).is_ok());
    }
}
