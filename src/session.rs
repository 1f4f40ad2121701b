//! A two-step upload-then-generate session.
//!
//! The original widget let the user pick an image (uploading it right
//! away) and press "generate" later, possibly several times. [`Session`]
//! carries that state explicitly instead of in globals: the current
//! upload lives in the session, generating without one is a typed error,
//! and `&mut self` receivers mean a session can never run two operations
//! at once.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::generate::http_client;
use crate::output::{GenerationOutput, GenerationStats, SavedArtifact};
use crate::pipeline::upload::UploadedImage;
use crate::pipeline::{extract, input, poll, submit, upload};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Holds the current upload between a file-selection step and one or more
/// generation runs.
#[derive(Debug, Default)]
pub struct Session {
    uploaded: Option<UploadedImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current upload, if any.
    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    /// Drop the current upload, returning the session to its initial state.
    pub fn reset(&mut self) {
        self.uploaded = None;
    }

    /// Upload a local image, replacing any previous upload.
    pub async fn upload(
        &mut self,
        path: impl AsRef<Path>,
        config: &GenerationConfig,
    ) -> Result<&UploadedImage, Img2ArtError> {
        let client = http_client(config)?;
        let image = input::resolve_image(path).await?;
        let uploaded = upload::upload(&client, config, &image).await?;
        info!(url = %uploaded.url, "session upload replaced");
        Ok(self.uploaded.insert(uploaded))
    }

    /// Run a generation against the current upload.
    ///
    /// Fails with [`Img2ArtError::NoUploadedImage`] when nothing has been
    /// uploaded yet. The upload is retained, so calling this again reuses
    /// the same CDN file for a fresh job.
    pub async fn generate(
        &mut self,
        config: &GenerationConfig,
    ) -> Result<GenerationOutput, Img2ArtError> {
        let result = self.run_generation(config).await;
        if let Err(ref e) = result {
            if let Some(ref cb) = config.progress_callback {
                cb.on_error(&e.to_string());
            }
        }
        result
    }

    /// Run a generation and download the artifact into `out_dir`.
    pub async fn generate_to_dir(
        &mut self,
        out_dir: impl AsRef<Path>,
        config: &GenerationConfig,
    ) -> Result<(GenerationOutput, SavedArtifact), Img2ArtError> {
        let output = self.generate(config).await?;
        let artifact =
            crate::generate::download_to_dir(&output.media_url, out_dir, config).await?;
        Ok((output, artifact))
    }

    async fn run_generation(
        &mut self,
        config: &GenerationConfig,
    ) -> Result<GenerationOutput, Img2ArtError> {
        let uploaded = self.uploaded.as_ref().ok_or(Img2ArtError::NoUploadedImage)?;

        let total_start = Instant::now();
        let client = http_client(config)?;

        let ticket = submit::submit(&client, config, &uploaded.url).await?;
        let (payload, polls) = poll::poll_until_terminal(&client, config, &ticket.job_id).await?;
        let media_url = extract::extract_media_url(&payload)?;

        let stats = GenerationStats {
            polls,
            upload_ms: 0,
            generation_ms: total_start.elapsed().as_millis() as u64,
            total_ms: total_start.elapsed().as_millis() as u64,
        };

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
}
