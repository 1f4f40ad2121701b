//! Error types for the img2art library.
//!
//! One variant per workflow stage: a failure anywhere aborts the whole job
//! and propagates to the caller unchanged, so the variant tells you exactly
//! which HTTP round trip (or local step) went wrong. Nothing here is fatal
//! to the process — every error leaves the caller free to retry the whole
//! operation. The only built-in fallback is inside the download stage,
//! which tries the direct strategy after the proxy strategy fails; by the
//! time [`Img2ArtError::Download`] surfaces, both are exhausted.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the img2art library.
#[derive(Debug, Error)]
pub enum Img2ArtError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not a recognised image format, and its
    /// extension gave no usable hint either.
    #[error("File is not a recognised image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    // ── Workflow stage errors ─────────────────────────────────────────────
    /// The signing request or the binary PUT failed.
    #[error("Upload failed: {detail}\nRe-select the file and try again.")]
    Upload { detail: String },

    /// The generation-submit request failed.
    #[error("Failed to submit generation job: {detail}")]
    Submission { detail: String },

    /// A status poll failed at the HTTP level. A single transient poll
    /// error aborts the whole job.
    #[error("Failed to check job status: {detail}")]
    Poll { detail: String },

    /// The service reported the job itself as failed.
    #[error("Generation failed: {message}")]
    Job { message: String },

    /// The poll budget ran out before the job reached a terminal status.
    #[error("Job timed out after {attempts} status checks (~{waited_secs}s)")]
    PollTimeout { attempts: u32, waited_secs: u64 },

    /// The job completed but its payload carried no usable media URL.
    #[error("No media URL in the result payload")]
    Extraction,

    /// Every download strategy (proxy, then direct) failed.
    #[error(
        "Download failed for '{url}': both the proxy and the direct fetch \
         were exhausted.\nOpen the URL in a browser and save the file manually."
    )]
    Download { url: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// Generation was requested on a session with no current upload.
    #[error("No uploaded image: upload an image first")]
    NoUploadedImage,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
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
