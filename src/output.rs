//! Output types returned by the workflow entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a completed generation run.
///
/// Serialisable so the CLI can emit it as JSON (`--json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Server-assigned job identifier.
    pub job_id: String,
    /// The extracted display URL of the generated media.
    pub media_url: String,
    /// The full terminal status payload, as received.
    pub payload: serde_json::Value,
    /// Timing and poll statistics for the run.
    pub stats: GenerationStats,
}

/// Per-stage statistics for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Number of status polls performed.
    pub polls: u32,
    /// Wall-clock time spent in the upload stage (sign + PUT).
    pub upload_ms: u64,
    /// Wall-clock time from job submission to terminal status.
    pub generation_ms: u64,
    /// Total wall-clock time of the run.
    pub total_ms: u64,
}

/// A generated asset saved to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedArtifact {
    /// Full path of the written file.
    pub path: PathBuf,
    /// Bare filename (`vector_art_<id>.<ext>`).
    pub file_name: String,
    /// Inferred extension (`jpg`, `png`, or `webp`).
    pub extension: String,
    /// Size of the written file in bytes.
    pub bytes: u64,
    /// Which download strategy produced the bytes (`proxy` or `direct`).
    pub strategy: String,
}
