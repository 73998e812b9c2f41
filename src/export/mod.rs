//! Report export: capture the on-screen analysis and hand it to the report
//! service, either as a downloadable PDF or as an email.
//!
//! ## Data Flow
//!
//! ```text
//! capture ──▶ encode ──▶ transport ──▶ disposition ──▶ download
//! (regions)   (PNG URI)  (JSON POST)   (filename)      (file)
//! ```
//!
//! 1. [`capture`]    : rasterise every matching region, in order
//! 2. [`encode`]     : PNG-encode into a `data:image/png;base64,` URI
//! 3. [`idempotency`]: one fresh key per submission attempt
//! 4. [`transport`]  : a single POST; non-success bodies become messages
//! 5. [`disposition`]: suggested filename from `Content-Disposition`
//! 6. [`download`]   : deliver the PDF bytes to disk
//!
//! [`pipeline`] ties the stages together behind [`ExportPipeline`].

pub mod capture;
pub mod disposition;
pub mod download;
pub mod encode;
pub mod idempotency;
pub mod pipeline;
pub mod transport;

pub use capture::{capture_scale, CaptureImage, CaptureRegion, ImageRegionCapturer, VisualCapturer};
pub use disposition::{filename_from_disposition, parse_filename};
pub use download::{DirectoryDownloader, Download, FileDownloader};
pub use idempotency::{IdempotencyKey, IDEMPOTENCY_HEADER};
pub use pipeline::{
    validate_email, EmailDraft, EmailReceipt, EmailRequest, ExportPipeline, ExportState,
    PdfReport, PdfRequest,
};
pub use transport::{upstream_error, upstream_message, HttpTransport, ReportTransport, TransportResponse};
