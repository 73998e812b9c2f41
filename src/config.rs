//! Configuration for the backend client and the export pipeline.
//!
//! Everything that used to come from ambient environment state (base URL,
//! credentials, endpoint paths, default titles) lives in one explicit
//! [`ReportConfig`], built via [`ReportConfigBuilder`] and passed into
//! [`crate::backend::BackendClient`] and [`crate::export::HttpTransport`] at
//! construction.
//!
//! # Precedence
//! 1. Values set on the builder.
//! 2. Environment variables, when starting from [`ReportConfig::from_env`]
//!    (`BACKEND_API_BASE_URL`, `API_USER`, `API_PASSWORD`,
//!    `FILING2KPI_TIMEOUT_SECS`).
//! 3. The defaults documented on each field.

use crate::error::FilingError;
use std::fmt;

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "BACKEND_API_BASE_URL";
/// Environment variable holding the Basic-auth user.
pub const ENV_API_USER: &str = "API_USER";
/// Environment variable holding the Basic-auth password.
pub const ENV_API_PASSWORD: &str = "API_PASSWORD";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "FILING2KPI_TIMEOUT_SECS";

/// Default CSS-like selector naming the capture regions.
pub const DEFAULT_CAPTURE_SELECTOR: &str = ".chart-capture";

/// Configuration shared by the backend client and the export pipeline.
///
/// # Example
/// ```rust
/// use filing2kpi::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .base_url("https://reports.internal:8443/")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://reports.internal:8443");
/// ```
#[derive(Clone, PartialEq)]
pub struct ReportConfig {
    /// Backend base URL without trailing slash. Default: `http://localhost:8000`.
    pub base_url: String,

    /// HTTP Basic user. Default: `admin`.
    pub api_user: String,

    /// HTTP Basic password. Default: `password123`.
    pub api_password: String,

    /// Whole-request timeout handed to the HTTP client. Default: 60.
    ///
    /// The pipeline imposes no timeout of its own.
    pub timeout_secs: u64,

    /// Path of the PDF report endpoint. Default: `/report/pdf`.
    pub pdf_path: String,

    /// Path of the email report endpoint. Default: `/report/email`.
    pub email_path: String,

    /// Selector naming the regions to capture. Default: `.chart-capture`.
    pub capture_selector: String,

    /// Title sent with PDF requests. Default: `EDINET解析レポート`.
    pub pdf_title: String,

    /// Download name used when the response carries no usable
    /// `Content-Disposition`. Default: `report.pdf`.
    pub filename_fallback: String,

    /// Default email subject. Default: `EDINET解析レポート`.
    pub email_subject: String,

    /// Default email body. Default: `解析結果を送付します。`.
    pub email_message: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_user: "admin".to_string(),
            api_password: "password123".to_string(),
            timeout_secs: 60,
            pdf_path: "/report/pdf".to_string(),
            email_path: "/report/email".to_string(),
            capture_selector: DEFAULT_CAPTURE_SELECTOR.to_string(),
            pdf_title: "EDINET解析レポート".to_string(),
            filename_fallback: "report.pdf".to_string(),
            email_subject: "EDINET解析レポート".to_string(),
            email_message: "解析結果を送付します。".to_string(),
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("base_url", &self.base_url)
            .field("api_user", &self.api_user)
            .field("api_password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("pdf_path", &self.pdf_path)
            .field("email_path", &self.email_path)
            .field("capture_selector", &self.capture_selector)
            .field("pdf_title", &self.pdf_title)
            .field("filename_fallback", &self.filename_fallback)
            .field("email_subject", &self.email_subject)
            .field("email_message", &self.email_message)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder starting from the documented defaults.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Create a builder seeded from the process environment.
    ///
    /// Unset or empty variables keep their defaults; an unparsable timeout
    /// is ignored.
    pub fn from_env() -> ReportConfigBuilder {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seed a builder from an arbitrary key lookup.
    ///
    /// [`ReportConfig::from_env`] delegates here with `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReportConfigBuilder {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();
        if let Some(url) = get(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(user) = get(ENV_API_USER) {
            builder = builder.api_user(user);
        }
        if let Some(pass) = get(ENV_API_PASSWORD) {
            builder = builder.api_password(pass);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()) {
            builder = builder.timeout_secs(secs);
        }
        builder
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn api_user(mut self, user: impl Into<String>) -> Self {
        self.config.api_user = user.into();
        self
    }

    pub fn api_password(mut self, password: impl Into<String>) -> Self {
        self.config.api_password = password.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn pdf_path(mut self, path: impl Into<String>) -> Self {
        self.config.pdf_path = path.into();
        self
    }

    pub fn email_path(mut self, path: impl Into<String>) -> Self {
        self.config.email_path = path.into();
        self
    }

    pub fn capture_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.capture_selector = selector.into();
        self
    }

    pub fn pdf_title(mut self, title: impl Into<String>) -> Self {
        self.config.pdf_title = title.into();
        self
    }

    pub fn filename_fallback(mut self, name: impl Into<String>) -> Self {
        self.config.filename_fallback = name.into();
        self
    }

    pub fn email_subject(mut self, subject: impl Into<String>) -> Self {
        self.config.email_subject = subject.into();
        self
    }

    pub fn email_message(mut self, message: impl Into<String>) -> Self {
        self.config.email_message = message.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, FilingError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(FilingError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        for (name, path) in [("pdf_path", &c.pdf_path), ("email_path", &c.email_path)] {
            if path.trim().is_empty() {
                return Err(FilingError::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        if c.filename_fallback.trim().is_empty() {
            return Err(FilingError::InvalidConfig(
                "filename fallback must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documentation() {
        let c = ReportConfig::default();
        assert_eq!(c.base_url, "http://localhost:8000");
        assert_eq!(c.api_user, "admin");
        assert_eq!(c.timeout_secs, 60);
        assert_eq!(c.capture_selector, ".chart-capture");
        assert_eq!(c.filename_fallback, "report.pdf");
        assert_eq!(c.endpoint(&c.pdf_path), "http://localhost:8000/report/pdf");
    }

    #[test]
    fn lookup_overrides_defaults_and_builder_overrides_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://backend:9000/"),
            (ENV_API_USER, "svc"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_API_PASSWORD, "  "),
        ]
        .into_iter()
        .collect();

        let c = ReportConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()))
            .api_user("override")
            .build()
            .unwrap();

        assert_eq!(c.base_url, "http://backend:9000");
        assert_eq!(c.api_user, "override");
        assert_eq!(c.api_password, "password123", "blank env keeps default");
        assert_eq!(c.timeout_secs, 15);
    }

    #[test]
    fn unparsable_timeout_is_ignored() {
        let c = ReportConfig::from_lookup(|k| (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .build()
            .unwrap();
        assert_eq!(c.timeout_secs, 60);
    }

    #[test]
    fn build_rejects_non_http_base() {
        let err = ReportConfig::builder().base_url("ftp://x").build().unwrap_err();
        assert!(matches!(err, FilingError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = ReportConfig::builder().api_password("s3cret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn debug_lists_every_other_field() {
        let c = ReportConfig::builder()
            .email_subject("四半期KPI")
            .email_message("ご確認ください")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        for field in [
            "base_url",
            "api_user",
            "timeout_secs",
            "pdf_path",
            "email_path",
            "capture_selector",
            "pdf_title",
            "filename_fallback",
            "email_subject",
            "email_message",
        ] {
            assert!(dbg.contains(field), "missing {field} in {dbg}");
        }
        assert!(dbg.contains("四半期KPI"));
        assert!(dbg.contains("ご確認ください"));
    }

    #[test]
    fn endpoint_handles_missing_leading_slash() {
        let c = ReportConfig::default();
        assert_eq!(c.endpoint("edinet/parse"), "http://localhost:8000/edinet/parse");
    }
}
