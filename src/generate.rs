//! Eager (whole-workflow) generation entry points.
//!
//! This module provides the simpler API: run the complete upload → submit →
//! poll → extract sequence and return once the media URL is known, with
//! [`generate_to_dir`] additionally downloading the artifact. Use
//! [`crate::stream::watch_job`] instead when you want status updates
//! progressively, and [`crate::session::Session`] when upload and
//! generation happen at different times.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::output::{GenerationOutput, GenerationStats, SavedArtifact};
use crate::pipeline::upload::UploadedImage;
use crate::pipeline::{download, extract, input, poll, submit, upload};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Build the HTTP client every stage shares.
pub(crate) fn http_client(config: &GenerationConfig) -> Result<reqwest::Client, Img2ArtError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| Img2ArtError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Upload a local image and return its public CDN URL, without starting
/// a generation job.
pub async fn upload_image(
    path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<UploadedImage, Img2ArtError> {
    let client = http_client(config)?;
    let image = input::resolve_image(path).await?;
    upload::upload(&client, config, &image).await
}

/// Generate vector art from a local image file.
///
/// This is the primary entry point for the library. It runs the whole
/// workflow up to and including media-URL extraction; the artifact is not
/// downloaded (use [`generate_to_dir`] for that).
///
/// # Arguments
/// * `input` — Local path of the source image
/// * `config` — Generation configuration
///
/// # Errors
/// Any stage failure aborts the run and is returned unchanged; the
/// [`Img2ArtError`] variant names the stage. The configured progress
/// callback's `on_error` fires before the error propagates.
pub async fn generate(
    input_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Img2ArtError> {
    let result = run_generation(input_path.as_ref(), config).await;
    if let Err(ref e) = result {
        if let Some(ref cb) = config.progress_callback {
            cb.on_error(&e.to_string());
        }
    }
    result
}

async fn run_generation(
    input_path: &Path,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Img2ArtError> {
    let total_start = Instant::now();
    info!(input = %input_path.display(), "starting generation");

    let client = http_client(config)?;

    // ── Step 1: Resolve and upload the input image ───────────────────────
    let upload_start = Instant::now();
    let image = input::resolve_image(input_path).await?;
    let uploaded = upload::upload(&client, config, &image).await?;
    let upload_ms = upload_start.elapsed().as_millis() as u64;

    // ── Step 2: Submit the job, then poll it to a terminal state ─────────
    let generation_start = Instant::now();
    let ticket = submit::submit(&client, config, &uploaded.url).await?;
    let (payload, polls) = poll::poll_until_terminal(&client, config, &ticket.job_id).await?;
    let generation_ms = generation_start.elapsed().as_millis() as u64;

    // ── Step 3: Extract the media URL from the terminal payload ──────────
    let media_url = extract::extract_media_url(&payload)?;

    let stats = GenerationStats {
        polls,
        upload_ms,
        generation_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        job_id = %ticket.job_id,
        polls,
        total_ms = stats.total_ms,
        "generation complete"
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(&media_url);
    }

    Ok(GenerationOutput {
        job_id: ticket.job_id,
        media_url,
        payload: serde_json::to_value(&payload)
            .map_err(|e| Img2ArtError::Internal(format!("payload reserialise: {e}")))?,
        stats,
    })
}

/// Generate vector art and download the artifact into `out_dir`.
///
/// The artifact filename is chosen by the library
/// (`vector_art_<id>.<ext>`); the file is written atomically.
pub async fn generate_to_dir(
    input_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<(GenerationOutput, SavedArtifact), Img2ArtError> {
    let output = generate(input_path, config).await?;
    let artifact = download_to_dir(&output.media_url, out_dir, config).await?;
    Ok((output, artifact))
}

/// Download an already-generated asset into `out_dir`.
///
/// Useful for re-fetching a result whose generation run has already
/// completed, e.g. after a failed first download. Like [`generate`],
/// the configured callback's `on_error` fires before an error
/// propagates.
pub async fn download_to_dir(
    media_url: &str,
    out_dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<SavedArtifact, Img2ArtError> {
    let client = http_client(config)?;
    let result = download::download(&client, config, media_url, out_dir).await;
    if let Err(ref e) = result {
        if let Some(ref cb) = config.progress_callback {
            cb.on_error(&e.to_string());
        }
    }
    result
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Img2ArtError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Img2ArtError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(input_path, config))
}
