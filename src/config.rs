//! Configuration for a generation run.
//!
//! All workflow behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share a config across calls, override a single
//! endpoint in tests, and diff two runs to understand why they behaved
//! differently.
//!
//! The defaults reproduce the production service contract exactly: the
//! fixed effect/model/tool identifiers, the four endpoint bases, the CDN
//! origin, and the 60 × 2 s poll budget. Callers normally override nothing.

use crate::error::Img2ArtError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Effect applied by the generation service.
pub const DEFAULT_EFFECT_ID: &str = "photoToVectorArt";
/// Model identifier the service expects for image effects.
pub const DEFAULT_MODEL: &str = "image-effects";
/// Tool type the service expects for image effects.
pub const DEFAULT_TOOL_TYPE: &str = "image-effects";
/// Fixed service account identifier.
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";
/// Endpoint that signs upload URLs.
pub const DEFAULT_UPLOAD_API: &str = "https://api.chromastudio.ai/get-emd-upload-url";
/// Endpoint that accepts generation jobs and serves status polls.
pub const DEFAULT_GEN_API: &str = "https://api.chromastudio.ai/image-gen";
/// Same-origin proxy used as the first download strategy.
pub const DEFAULT_DOWNLOAD_PROXY: &str = "https://api.chromastudio.ai/download-proxy";
/// Content-delivery origin where uploaded files become publicly reachable.
pub const DEFAULT_CDN_DOMAIN: &str = "https://contents.maxstudio.ai";

/// Configuration for the upload → submit → poll → download workflow.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use img2art::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .max_polls(30)
///     .poll_interval_ms(1000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Effect identifier sent in the submit payload. Default: `photoToVectorArt`.
    pub effect_id: String,

    /// Model identifier sent in the submit payload. Default: `image-effects`.
    pub model: String,

    /// Tool type sent in the submit payload. Default: `image-effects`.
    pub tool_type: String,

    /// Service user identifier; also part of the status-poll path.
    pub user_id: String,

    /// Base URL of the upload-URL signing endpoint.
    pub upload_api: String,

    /// Base URL of the generation endpoint (submit + status polls).
    pub gen_api: String,

    /// Base URL of the download proxy.
    pub download_proxy: String,

    /// CDN origin uploads become reachable under.
    pub cdn_domain: String,

    /// Delay between status polls in milliseconds. Default: 2000.
    ///
    /// The service contract expects 2 s; lowering it mostly trades extra
    /// HTTP round trips for marginally earlier completion detection.
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up. Default: 60.
    ///
    /// 60 polls at the default interval bound the wait at roughly two
    /// minutes, which covers the service's slowest observed generations.
    pub max_polls: u32,

    /// Per-request HTTP timeout in seconds. Default: 120.
    pub http_timeout_secs: u64,

    /// Optional observer notified at each workflow transition.
    ///
    /// This is the seam that replaces the original widget's DOM helpers:
    /// a CLI hangs a progress bar here, a server might forward events to a
    /// WebSocket, tests count invocations. `None` means no reporting.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            effect_id: DEFAULT_EFFECT_ID.to_string(),
            model: DEFAULT_MODEL.to_string(),
            tool_type: DEFAULT_TOOL_TYPE.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            upload_api: DEFAULT_UPLOAD_API.to_string(),
            gen_api: DEFAULT_GEN_API.to_string(),
            download_proxy: DEFAULT_DOWNLOAD_PROXY.to_string(),
            cdn_domain: DEFAULT_CDN_DOMAIN.to_string(),
            poll_interval_ms: 2000,
            max_polls: 60,
            http_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("effect_id", &self.effect_id)
            .field("model", &self.model)
            .field("tool_type", &self.tool_type)
            .field("user_id", &self.user_id)
            .field("upload_api", &self.upload_api)
            .field("gen_api", &self.gen_api)
            .field("download_proxy", &self.download_proxy)
            .field("cdn_domain", &self.cdn_domain)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the status endpoint for a given job.
    pub(crate) fn status_url(&self, job_id: &str) -> String {
        format!(
            "{}/{}/{}/status",
            self.gen_api.trim_end_matches('/'),
            self.user_id,
            job_id
        )
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn effect_id(mut self, v: impl Into<String>) -> Self {
        self.config.effect_id = v.into();
        self
    }

    pub fn model(mut self, v: impl Into<String>) -> Self {
        self.config.model = v.into();
        self
    }

    pub fn tool_type(mut self, v: impl Into<String>) -> Self {
        self.config.tool_type = v.into();
        self
    }

    pub fn user_id(mut self, v: impl Into<String>) -> Self {
        self.config.user_id = v.into();
        self
    }

    pub fn upload_api(mut self, v: impl Into<String>) -> Self {
        self.config.upload_api = v.into();
        self
    }

    pub fn gen_api(mut self, v: impl Into<String>) -> Self {
        self.config.gen_api = v.into();
        self
    }

    pub fn download_proxy(mut self, v: impl Into<String>) -> Self {
        self.config.download_proxy = v.into();
        self
    }

    pub fn cdn_domain(mut self, v: impl Into<String>) -> Self {
        self.config.cdn_domain = v.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n.max(1);
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Img2ArtError> {
        let c = &self.config;
        for (name, value) in [
            ("upload_api", &c.upload_api),
            ("gen_api", &c.gen_api),
            ("download_proxy", &c.download_proxy),
            ("cdn_domain", &c.cdn_domain),
        ] {
            if value.is_empty() {
                return Err(Img2ArtError::InvalidConfig(format!(
                    "{name} must not be empty"
                )));
            }
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(Img2ArtError::InvalidConfig(format!(
                    "{name} must be an HTTP(S) URL, got '{value}'"
                )));
            }
        }
        if c.max_polls == 0 {
            return Err(Img2ArtError::InvalidConfig("max_polls must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = GenerationConfig::default();
        assert_eq!(c.effect_id, "photoToVectorArt");
        assert_eq!(c.model, "image-effects");
        assert_eq!(c.tool_type, "image-effects");
        assert_eq!(c.poll_interval_ms, 2000);
        assert_eq!(c.max_polls, 60);
        assert!(c.gen_api.starts_with("https://"));
    }

    #[test]
    fn status_url_layout() {
        let c = GenerationConfig::builder()
            .gen_api("https://api.example/image-gen")
            .user_id("user1")
            .build()
            .unwrap();
        assert_eq!(
            c.status_url("job-42"),
            "https://api.example/image-gen/user1/job-42/status"
        );
    }

    #[test]
    fn status_url_tolerates_trailing_slash() {
        let c = GenerationConfig::builder()
            .gen_api("https://api.example/image-gen/")
            .user_id("u")
            .build()
            .unwrap();
        assert_eq!(
            c.status_url("j"),
            "https://api.example/image-gen/u/j/status"
        );
    }

    #[test]
    fn build_rejects_non_http_endpoint() {
        let err = GenerationConfig::builder()
            .gen_api("ftp://api.example")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("gen_api"));
    }

    #[test]
    fn build_rejects_empty_cdn() {
        let err = GenerationConfig::builder()
            .cdn_domain("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cdn_domain"));
    }

    #[test]
    fn max_polls_clamped_to_one() {
        let c = GenerationConfig::builder().max_polls(0).build().unwrap();
        assert_eq!(c.max_polls, 1);
    }
}
