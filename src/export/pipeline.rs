//! The export pipeline: capture → idempotent submission → response handling.
//!
//! ```text
//! Idle ──▶ Capturing ──▶ Submitting ──▶ Succeeded ─┐
//!   ▲                         │                     │
//!   │                         └──────▶ Failed ──────┤
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! One pipeline backs one export control. While a submission is outstanding
//! further calls return [`FilingError::Busy`] without side effects; whatever
//! happens, the pipeline is back in [`ExportState::Idle`] when the call
//! returns. Nothing is retried automatically.

use crate::config::ReportConfig;
use crate::error::{FilingError, ValidationError};
use crate::export::capture::{CaptureImage, VisualCapturer};
use crate::export::disposition::filename_from_disposition;
use crate::export::download::{Download, FileDownloader};
use crate::export::idempotency::IdempotencyKey;
use crate::export::transport::{upstream_error, ReportTransport, TransportResponse};
use crate::progress::ExportProgress;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Where an export currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportState {
    #[default]
    Idle,
    Capturing,
    Submitting,
    Succeeded,
    Failed,
}

/// Body of a PDF report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfRequest {
    pub title: String,
    pub images: Vec<CaptureImage>,
}

/// Body of an email report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
    pub images: Vec<CaptureImage>,
}

/// What the user filled in for an email export. Unset fields take the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailDraft {
    pub to: String,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl EmailDraft {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A delivered PDF report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfReport {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub images: usize,
    pub idempotency_key: IdempotencyKey,
}

/// Acknowledgement of a sent email report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    pub to: String,
    /// `status` field of the service's JSON answer, when present.
    pub status: Option<String>,
    pub images: usize,
    pub idempotency_key: IdempotencyKey,
}

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Check a recipient has the minimal `local@domain.tld` shape.
///
/// Returns the trimmed address.
pub fn validate_email(address: &str) -> Result<String, ValidationError> {
    let trimmed = address.trim();
    if RE_EMAIL.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidEmail {
            address: address.to_string(),
        })
    }
}

// ── State tracking ───────────────────────────────────────────────────────

struct StateCell {
    busy: AtomicBool,
    state: Mutex<ExportState>,
    progress: Option<ExportProgress>,
}

impl StateCell {
    fn get(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, state: ExportState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        debug!("Export state → {:?}", state);
        if let Some(cb) = &self.progress {
            cb.on_state_change(state);
        }
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { cell: self })
    }
}

/// Holds the busy flag; dropping it returns the pipeline to `Idle`.
struct BusyGuard<'a> {
    cell: &'a StateCell,
}

impl BusyGuard<'_> {
    fn finish<T>(&self, result: &Result<T, FilingError>) {
        match result {
            Ok(_) => self.cell.set(ExportState::Succeeded),
            Err(e) => {
                warn!("Export failed: {}", e);
                self.cell.set(ExportState::Failed);
            }
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.cell.set(ExportState::Idle);
        self.cell.busy.store(false, Ordering::Release);
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Export pipeline over injected capture, transport and download
/// capabilities.
pub struct ExportPipeline<C, T, D> {
    capturer: C,
    transport: T,
    downloader: D,
    config: ReportConfig,
    cell: StateCell,
}

impl<C, T, D> ExportPipeline<C, T, D>
where
    C: VisualCapturer,
    T: ReportTransport,
    D: FileDownloader,
{
    pub fn new(config: ReportConfig, capturer: C, transport: T, downloader: D) -> Self {
        Self {
            capturer,
            transport,
            downloader,
            config,
            cell: StateCell {
                busy: AtomicBool::new(false),
                state: Mutex::new(ExportState::Idle),
                progress: None,
            },
        }
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ExportProgress) -> Self {
        self.cell.progress = Some(progress);
        self
    }

    pub fn state(&self) -> ExportState {
        self.cell.get()
    }

    pub fn is_busy(&self) -> bool {
        self.cell.busy.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn capturer(&self) -> &C {
        &self.capturer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Capture the view, request a PDF and hand it to the downloader.
    ///
    /// `title` defaults to the configured PDF title.
    pub async fn export_pdf(&self, title: Option<&str>) -> Result<PdfReport, FilingError> {
        let guard = self.cell.try_begin().ok_or(FilingError::Busy)?;
        let title = title.unwrap_or(&self.config.pdf_title).to_string();
        let result = self.run_pdf(title).await;
        guard.finish(&result);
        result
    }

    /// Validate the recipient, capture the view and request an email report.
    ///
    /// An invalid recipient fails before any capture or network work.
    pub async fn export_email(&self, draft: &EmailDraft) -> Result<EmailReceipt, FilingError> {
        let to = validate_email(&draft.to)?;
        let guard = self.cell.try_begin().ok_or(FilingError::Busy)?;
        let result = self.run_email(to, draft).await;
        guard.finish(&result);
        result
    }

    async fn capture(&self) -> Vec<CaptureImage> {
        self.cell.set(ExportState::Capturing);
        let images = self.capturer.capture(&self.config.capture_selector).await;
        info!("Captured {} image(s)", images.len());
        if let Some(cb) = &self.cell.progress {
            cb.on_captured(images.len());
        }
        images
    }

    async fn submit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(IdempotencyKey, TransportResponse), FilingError> {
        self.cell.set(ExportState::Submitting);
        let key = IdempotencyKey::generate();
        let body = serde_json::to_vec(body)
            .map_err(|e| FilingError::Internal(format!("request encoding failed: {e}")))?;
        debug!("Submitting to {} with key {}", path, key);

        let response = self.transport.post_json(path, &key, body).await?;
        if let Some(cb) = &self.cell.progress {
            cb.on_response(response.status);
        }
        if !response.is_success() {
            return Err(upstream_error(&response));
        }
        Ok((key, response))
    }

    async fn run_pdf(&self, title: String) -> Result<PdfReport, FilingError> {
        let images = self.capture().await;
        let image_count = images.len();
        let request = PdfRequest { title, images };
        let (key, response) = self.submit(&self.config.pdf_path, &request).await?;

        let filename = filename_from_disposition(
            response.content_disposition.as_deref(),
            &self.config.filename_fallback,
        );
        let content_type = response
            .content_type
            .clone()
            .unwrap_or_else(|| "application/pdf".to_string());
        let size = response.body.len();

        let path = self
            .downloader
            .save(Download {
                filename: filename.clone(),
                content_type: content_type.clone(),
                bytes: response.body,
            })
            .await?;

        Ok(PdfReport {
            path,
            filename,
            content_type,
            size,
            images: image_count,
            idempotency_key: key,
        })
    }

    async fn run_email(&self, to: String, draft: &EmailDraft) -> Result<EmailReceipt, FilingError> {
        let images = self.capture().await;
        let image_count = images.len();
        let request = EmailRequest {
            to,
            subject: draft
                .subject
                .clone()
                .unwrap_or_else(|| self.config.email_subject.clone()),
            message: draft
                .message
                .clone()
                .unwrap_or_else(|| self.config.email_message.clone()),
            images,
        };
        let (key, response) = self.submit(&self.config.email_path, &request).await?;

        let status = serde_json::from_slice::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(str::to_string));
        info!("Email report accepted for {}", request.to);

        Ok(EmailReceipt {
            to: request.to,
            status,
            images: image_count,
            idempotency_key: key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert_eq!(validate_email(" analyst@example.co.jp ").unwrap(), "analyst@example.co.jp");
        assert!(validate_email("a@b.c").is_ok());
        for bad in ["not-an-email", "a@b", "@b.c", "a@.c", "a b@c.d", "a@b.", ""] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn email_request_wire_shape() {
        let req = EmailRequest {
            to: "a@b.c".into(),
            subject: "s".into(),
            message: "m".into(),
            images: vec![],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, serde_json::json!({"to": "a@b.c", "subject": "s", "message": "m", "images": []}));
    }

    #[test]
    fn draft_builder() {
        let d = EmailDraft::new("x@y.z").subject("Q3").message("see attached");
        assert_eq!(d.subject.as_deref(), Some("Q3"));
        assert_eq!(d.message.as_deref(), Some("see attached"));
    }
}
