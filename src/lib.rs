//! # filing2kpi
//!
//! Turn parsed EDINET financial statements into canonical KPI rows, and
//! export the resulting charts as a PDF or email report.
//!
//! ## Why this crate?
//!
//! Statements parsed out of real filings are loosely shaped. The same line
//! item shows up as `売上高`, `売上収益`, `Revenue` or `NetSales`, and values
//! arrive as numbers, `"1,234"` strings, or objects keyed by fiscal period.
//! The statement engine resolves all of that into a fixed list of rows per
//! statement, never failing on bad input. The export pipeline then ships the
//! rendered charts to a report service with per-attempt idempotency keys.
//!
//! ## Pipeline Overview
//!
//! ```text
//! backend ──▶ statement ──▶ (charts) ──▶ export
//!  │            │                         ├─ capture   regions → PNG data URIs
//!  │            ├─ normalize keys         ├─ submit    JSON POST + idempotency key
//!  │            ├─ coerce values          └─ deliver   PDF download / email receipt
//!  │            └─ resolve → rows
//!  └─ filings   list, sort, page
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use filing2kpi::{ParsedFiling, StatementRows};
//! use serde_json::json;
//!
//! let filing: ParsedFiling = serde_json::from_value(json!({
//!     "PL": { "売上高": "1,234", "営業利益": { "2023": 90, "2024": 120 } }
//! })).unwrap();
//! let rows = StatementRows::from_filing(&filing);
//! assert_eq!(rows.pl[0].x, "売上高");
//! assert_eq!(rows.pl[0].value, 1234.0);
//! assert_eq!(rows.pl[1].value, 120.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `filing2kpi` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! filing2kpi = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod filings;
pub mod progress;
pub mod statement;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::BackendClient;
pub use config::{ReportConfig, ReportConfigBuilder};
pub use error::{FilingError, ValidationError};
pub use export::{
    DirectoryDownloader, EmailDraft, EmailReceipt, ExportPipeline, ExportState, HttpTransport,
    ImageRegionCapturer, PdfReport,
};
pub use filings::{
    paginate, sort_filings, validate_date, FilingPeriod, FilingQuery, FilingSummary, PageView,
    SortDirection, SortKey,
};
pub use progress::{ExportProgress, ExportProgressCallback, NoopExportProgress};
pub use statement::{build_rows, resolve, LineItemCandidate, ParsedFiling, Row, Statement, StatementRows};
