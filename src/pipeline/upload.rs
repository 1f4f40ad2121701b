//! Upload stage: signed-URL request, binary PUT, public URL derivation.
//!
//! The storage contract is three-legged: the signing endpoint hands out a
//! time-limited pre-authorised URL keyed by filename, the client PUTs the
//! raw bytes there, and the file then becomes reachable under the CDN
//! origin at the same filename. The filename is randomised client-side so
//! concurrent users can never collide; only the extension survives from
//! the original name.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::pipeline::input::ResolvedImage;
use rand::Rng;
use tracing::{debug, info};

/// Length of the random identifier in derived upload filenames.
pub const UPLOAD_ID_LEN: usize = 21;

/// A stored input image, publicly reachable under the CDN origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Public CDN URL of the stored file.
    pub url: String,
    /// The derived filename (`<21 alphanumerics>.<ext>`).
    pub file_name: String,
}

/// Generate a random alphanumeric identifier of the given length.
pub fn random_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Derive the CDN filename for an upload: a fresh 21-character random id
/// plus the original extension, case preserved.
pub fn derive_file_name(extension: &str) -> String {
    format!("{}.{}", random_id(UPLOAD_ID_LEN), extension)
}

/// Public CDN URL for a derived filename.
pub fn cdn_url(config: &GenerationConfig, file_name: &str) -> String {
    format!("{}/{}", config.cdn_domain.trim_end_matches('/'), file_name)
}

/// Upload a resolved image and return its public URL.
///
/// Fails with [`Img2ArtError::Upload`] if the signing request or the PUT
/// returns a non-success status. There is no retry; the caller surfaces
/// the failure and the user re-selects the file.
pub async fn upload(
    client: &reqwest::Client,
    config: &GenerationConfig,
    image: &ResolvedImage,
) -> Result<UploadedImage, Img2ArtError> {
    let file_name = derive_file_name(&image.extension);

    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_start(&file_name);
    }

    // Leg 1: signed URL, keyed by the derived filename.
    let response = client
        .get(&config.upload_api)
        .query(&[("fileName", file_name.as_str())])
        .send()
        .await
        .map_err(|e| Img2ArtError::Upload {
            detail: format!("signing request failed: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(Img2ArtError::Upload {
            detail: format!("signing request returned HTTP {}", response.status()),
        });
    }

    let signed_url = response
        .text()
        .await
        .map_err(|e| Img2ArtError::Upload {
            detail: format!("unreadable signing response: {e}"),
        })?
        .trim()
        .to_string();
    debug!("got signed upload URL");

    // Leg 2: raw PUT of the file bytes.
    let put = client
        .put(&signed_url)
        .header(reqwest::header::CONTENT_TYPE, &image.mime)
        .body(image.bytes.clone())
        .send()
        .await
        .map_err(|e| Img2ArtError::Upload {
            detail: format!("PUT to signed URL failed: {e}"),
        })?;

    if !put.status().is_success() {
        return Err(Img2ArtError::Upload {
            detail: format!("PUT to signed URL returned HTTP {}", put.status()),
        });
    }

    // Leg 3: the public URL is CDN origin + filename by construction.
    let url = cdn_url(config, &file_name);
    info!(%url, "upload complete");

    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_complete(&url);
    }

    Ok(UploadedImage { url, file_name })
}
