//! Input resolution: read and validate the local image file.
//!
//! ## Why sniff magic bytes?
//!
//! The upload PUT carries the file's MIME type as `Content-Type`, and the
//! browser original got that for free from the `File` object. Here we
//! recover it from the bytes themselves via [`image::guess_format`], which
//! also catches "not actually an image" before we spend two HTTP round
//! trips uploading garbage. The file extension is kept separately — and
//! case-preserved — because the derived CDN filename must end with the
//! original extension exactly.

use crate::error::Img2ArtError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fallback extension when the input file has none.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// A resolved input image, fully read into memory.
///
/// Input photos are a few megabytes at most, so buffering the whole file
/// keeps the upload stage a single PUT with a known `Content-Length`.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Original path, kept for error reporting.
    pub path: PathBuf,
    /// Raw file bytes, sent verbatim as the PUT body.
    pub bytes: Vec<u8>,
    /// Original extension with its case preserved, `jpg` when absent.
    pub extension: String,
    /// MIME type for the PUT `Content-Type` header.
    pub mime: String,
}

/// Read the file at `path` and derive its extension and MIME type.
///
/// The MIME type comes from magic-byte sniffing when the format is
/// recognised, falling back to the extension. A file that neither sniffs
/// as an image nor carries a known image extension is rejected with
/// [`Img2ArtError::NotAnImage`].
pub async fn resolve_image(path: impl AsRef<Path>) -> Result<ResolvedImage, Img2ArtError> {
    let path = path.as_ref().to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Img2ArtError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Img2ArtError::FileNotFound { path });
        }
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_string())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let mime = match image::guess_format(&bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => match mime_for_extension(&extension) {
            Some(m) => m.to_string(),
            None => {
                let mut magic = [0u8; 4];
                let n = bytes.len().min(4);
                magic[..n].copy_from_slice(&bytes[..n]);
                return Err(Img2ArtError::NotAnImage { path, magic });
            }
        },
    };

    debug!(path = %path.display(), %mime, %extension, "resolved input image");

    Ok(ResolvedImage {
        path,
        bytes,
        extension,
        mime,
    })
}

/// MIME type for a known image extension (case-insensitive), if any.
fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn extension_case_is_preserved() {
        let (_dir, path) = write_temp("cat.PNG", PNG_MAGIC);
        let img = resolve_image(&path).await.unwrap();
        assert_eq!(img.extension, "PNG");
        assert_eq!(img.mime, "image/png");
    }

    #[tokio::test]
    async fn missing_extension_defaults_to_jpg() {
        let (_dir, path) = write_temp("photo", &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]);
        let img = resolve_image(&path).await.unwrap();
        assert_eq!(img.extension, "jpg");
        assert_eq!(img.mime, "image/jpeg");
    }

    #[tokio::test]
    async fn unknown_bytes_with_image_extension_fall_back_to_extension() {
        let (_dir, path) = write_temp("weird.webp", b"not really an image");
        let img = resolve_image(&path).await.unwrap();
        assert_eq!(img.mime, "image/webp");
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let (_dir, path) = write_temp("notes.txt", b"hello world");
        let err = resolve_image(&path).await.unwrap_err();
        assert!(matches!(err, Img2ArtError::NotAnImage { .. }), "{err}");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_image("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, Img2ArtError::FileNotFound { .. }), "{err}");
    }

    #[test]
    fn mime_lookup_is_case_insensitive() {
        assert_eq!(mime_for_extension("JPEG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("Png"), Some("image/png"));
        assert_eq!(mime_for_extension("tiff"), None);
    }
}
