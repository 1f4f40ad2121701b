//! Extract stage: locate the display URL in a terminal payload.
//!
//! The service has returned results in several shapes over time: `result`
//! may be a single item or an ordered sequence (first element wins), and
//! the URL inside an item has lived under three different keys. The
//! priority order below matches the service's own client; a missing,
//! null, or empty value falls through to the next key.

use crate::error::Img2ArtError;
use crate::pipeline::poll::StatusPayload;
use serde_json::Value;

/// Keys tried on the result item, in priority order.
const URL_KEYS: [&str; 3] = ["mediaUrl", "video", "image"];

/// Pull the single display URL out of a completed job's payload.
///
/// Fails with [`Img2ArtError::Extraction`] when `result` is absent, the
/// sequence is empty, or none of the known keys yields a non-empty string.
pub fn extract_media_url(payload: &StatusPayload) -> Result<String, Img2ArtError> {
    let result = payload.result.as_ref().ok_or(Img2ArtError::Extraction)?;

    let item: &Value = match result.as_array() {
        Some(items) => items.first().ok_or(Img2ArtError::Extraction)?,
        None => result,
    };

    URL_KEYS
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(Img2ArtError::Extraction)
}
