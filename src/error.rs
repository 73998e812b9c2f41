//! Error types for the filing2kpi library.
//!
//! Three tiers reflect three distinct failure modes:
//!
//! * *Unresolved fields* are not errors at all. The statement engine returns
//!   `Option` and silently omits rows it cannot resolve, so malformed filings
//!   never surface here.
//!
//! * [`ValidationError`]: **Local**: the user typed something the pipeline
//!   refuses to send (a recipient without a domain, a date that is not
//!   `YYYY-MM-DD`). Raised before any capture or network work happens.
//!
//! * [`FilingError`]: **Per action**: an export or backend call failed. The
//!   invoking view shows the message and stays usable; nothing is retried
//!   automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Input rejected locally, before anything is sent to the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Recipient address does not have a `local@domain.tld` shape.
    #[error("Invalid recipient address '{address}': expected local@domain.tld")]
    InvalidEmail { address: String },

    /// Date input is not a real calendar date in `YYYY-MM-DD` form.
    #[error("Invalid date '{input}': use YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Range start lies after range end.
    #[error("Invalid range {start}..{end}: start must be on or before end")]
    InvalidRange { start: String, end: String },

    /// Filing search needs an EDINET code.
    #[error("EDINET code is required")]
    MissingEdinetCode,

    /// Parse requests need a document id.
    #[error("Document id is required")]
    EmptyDocumentId,
}

/// All errors returned by export and backend operations.
#[derive(Debug, Error)]
pub enum FilingError {
    // ── Local errors ──────────────────────────────────────────────────────
    /// Input failed local validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another submission from the same control is still outstanding.
    #[error("A submission is already in progress")]
    Busy,

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The report or backend service answered with a non-success status.
    ///
    /// `message` is the service's `detail`/`error` field when the body was
    /// JSON, otherwise the raw body text.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Request failed. Check your connection and try again.")]
    Transport { detail: String },

    /// A success response whose body could not be understood.
    #[error("Unexpected response from service: {0}")]
    InvalidResponse(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The downloaded report could not be written.
    #[error("Failed to write report file '{path}': {source}")]
    DownloadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FilingError {
    /// HTTP status of an upstream failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FilingError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the failure happened locally and no request was made.
    pub fn is_local(&self) -> bool {
        matches!(self, FilingError::Validation(_) | FilingError::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_is_service_message() {
        let e = FilingError::Upstream {
            status: 500,
            message: "pdf generation failed".into(),
        };
        assert_eq!(e.to_string(), "pdf generation failed");
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn transport_display_is_generic() {
        let e = FilingError::Transport {
            detail: "dns error: no such host".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("failed"), "got: {msg}");
        assert!(!msg.contains("dns"), "detail must not leak: {msg}");
    }

    #[test]
    fn validation_converts_and_is_local() {
        let e: FilingError = ValidationError::InvalidEmail {
            address: "not-an-email".into(),
        }
        .into();
        assert!(e.is_local());
        assert!(e.to_string().contains("not-an-email"));
        assert_eq!(e.status(), None);
    }

    #[test]
    fn invalid_range_display() {
        let e = ValidationError::InvalidRange {
            start: "2024-05-01".into(),
            end: "2024-04-01".into(),
        };
        assert!(e.to_string().contains("2024-05-01..2024-04-01"));
    }
}
