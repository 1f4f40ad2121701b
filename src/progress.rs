//! Progress-callback trait for workflow state transitions.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! real-time events as the workflow moves through upload, submission,
//! polling, and download.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a channel, a WebSocket,
//! or a log — without the library knowing anything about how the host
//! application renders state. This is the abstraction that replaces the
//! original widget's DOM helpers (`showLoading`, `updateStatus`, …): the
//! core workflow never touches a rendering technology.
//!
//! # Example
//!
//! ```rust
//! use img2art::{GenerationProgressCallback, GenerationConfig};
//! use std::sync::Arc;
//!
//! struct Logging;
//!
//! impl GenerationProgressCallback for Logging {
//!     fn on_poll(&self, attempt: u32, max: u32, status: &str) {
//!         eprintln!("poll {attempt}/{max}: {status}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Logging))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the workflow as it transitions between stages.
///
/// Implementations must be `Send + Sync` so a callback can be shared with
/// spawned tasks. All methods have default no-op implementations so callers
/// only override what they care about. Within one workflow invocation the
/// methods are called sequentially, in stage order.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called before the signing request, with the derived CDN filename.
    fn on_upload_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Called once the file is stored, with its public CDN URL.
    fn on_upload_complete(&self, url: &str) {
        let _ = url;
    }

    /// Called when the generation job has been accepted.
    fn on_job_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// Called after every status poll.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed poll number
    /// * `max`     — poll budget
    /// * `status`  — wire status string (`queued`, `processing`, …)
    fn on_poll(&self, attempt: u32, max: u32, status: &str) {
        let _ = (attempt, max, status);
    }

    /// Called when the job completed and a media URL was extracted.
    fn on_generation_complete(&self, media_url: &str) {
        let _ = media_url;
    }

    /// Called before the first download strategy is attempted.
    fn on_download_start(&self, url: &str) {
        let _ = url;
    }

    /// Called each time a download strategy fails, including the last
    /// one. A later [`Self::on_download_complete`] means a subsequent
    /// strategy succeeded; otherwise the download as a whole failed.
    fn on_download_fallback(&self, strategy: &str, error: &str) {
        let _ = (strategy, error);
    }

    /// Called when the artifact has been written to disk.
    fn on_download_complete(&self, file_name: &str, bytes: u64) {
        let _ = (file_name, bytes);
    }

    /// Called once when the workflow aborts with an error, before the
    /// error is returned to the caller. The workflow is retryable after
    /// this fires.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
