//! # img2art
//!
//! Turn a photo into vector art through a hosted image-effects service.
//!
//! ## Why this crate?
//!
//! The service exposes no SDK, only four loosely documented HTTP endpoints
//! with quirks: a text-body signing endpoint, a fixed submit payload,
//! status polling on a strict cadence, result payloads whose shape has
//! changed over time, and a CDN that sometimes needs a proxy to download
//! from. This crate encodes all of that once, behind a typed API, so
//! callers write `generate("photo.jpg")` instead of re-deriving the wire
//! contract.
//!
//! ## Workflow Overview
//!
//! ```text
//! photo.jpg
//!  │
//!  ├─ 1. Input     read file, infer content type, randomise filename
//!  ├─ 2. Upload    signed-URL GET, binary PUT, public CDN URL
//!  ├─ 3. Submit    POST the generation job, receive a job id
//!  ├─ 4. Poll      GET status every 2 s, up to 60 times
//!  ├─ 5. Extract   pull the media URL from the terminal payload
//!  └─ 6. Download  proxy fetch, direct fallback, atomic save
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2art::{generate_to_dir, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::default();
//!     let (output, artifact) = generate_to_dir("photo.jpg", ".", &config).await?;
//!     println!("saved {} ({} bytes)", artifact.path.display(), artifact.bytes);
//!     eprintln!("job {} finished after {} polls", output.job_id, output.stats.polls);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2art` binary (clap + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! img2art = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::Img2ArtError;
pub use generate::{download_to_dir, generate, generate_sync, generate_to_dir, upload_image};
pub use output::{GenerationOutput, GenerationStats, SavedArtifact};
pub use pipeline::poll::{JobStatus, StatusPayload};
pub use pipeline::upload::UploadedImage;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::Session;
pub use stream::{watch_job, JobUpdate, UpdateStream};
