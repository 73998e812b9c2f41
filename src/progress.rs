//! Progress-callback trait for export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::export::ExportPipeline::with_progress`] to follow an export as it
//! moves through its states. The CLI drives a spinner from it; a GUI would
//! disable its button while the state is not [`ExportState::Idle`].
//!
//! # Example
//!
//! ```rust
//! use filing2kpi::{ExportProgressCallback, ExportState};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct Recorder {
//!     states: Mutex<Vec<ExportState>>,
//! }
//!
//! impl ExportProgressCallback for Recorder {
//!     fn on_state_change(&self, state: ExportState) {
//!         self.states.lock().unwrap().push(state);
//!     }
//! }
//! ```

use crate::export::ExportState;
use std::sync::Arc;

/// Called by the export pipeline as a submission progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExportProgressCallback: Send + Sync {
    /// Called on every state transition, including the final return to
    /// [`ExportState::Idle`].
    fn on_state_change(&self, state: ExportState) {
        let _ = state;
    }

    /// Called once capture finishes.
    ///
    /// # Arguments
    /// * `images`: number of regions captured (may be zero)
    fn on_captured(&self, images: usize) {
        let _ = images;
    }

    /// Called when the service answers, before the body is interpreted.
    ///
    /// # Arguments
    /// * `status`: HTTP status code
    fn on_response(&self, status: u16) {
        let _ = status;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopExportProgress;

impl ExportProgressCallback for NoopExportProgress {}

/// Convenience alias for the type stored by the pipeline.
pub type ExportProgress = Arc<dyn ExportProgressCallback>;
