//! Download stage: fetch the generated asset and save it to disk.
//!
//! The asset lives on a third-party CDN, so the browser original needed a
//! same-origin proxy to get at the bytes, with a direct cross-origin fetch
//! as fallback. The two-tier order is preserved here as an explicit list
//! of [`DownloadStrategy`] values tried in sequence, each independently
//! testable. The proxy also normalises headers the direct fetch may lack.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::output::SavedArtifact;
use crate::pipeline::upload::random_id;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Length of the random identifier in artifact filenames.
pub const ARTIFACT_ID_LEN: usize = 8;

/// Extension used when neither the content type nor the URL gives a hint.
const FALLBACK_EXTENSION: &str = "png";

/// Matches the first image extension occurring in a URL.
static URL_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|webp)").expect("valid extension regex"));

/// One way of getting the asset bytes. Tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// Fetch through the same-origin download proxy.
    Proxy,
    /// Fetch the asset URL directly, with a cache-busting parameter.
    Direct,
}

/// The full strategy order. The proxy goes first because it reliably
/// serves a usable `content-type`; the direct fetch is a best effort.
pub const STRATEGY_ORDER: [DownloadStrategy; 2] =
    [DownloadStrategy::Proxy, DownloadStrategy::Direct];

impl DownloadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStrategy::Proxy => "proxy",
            DownloadStrategy::Direct => "direct",
        }
    }

    /// Attempt this strategy once. Returns the body and declared content
    /// type on success, or a human-readable reason on failure.
    async fn fetch(
        &self,
        client: &reqwest::Client,
        config: &GenerationConfig,
        url: &str,
    ) -> Result<Fetched, String> {
        let request = match self {
            DownloadStrategy::Proxy => client
                .get(&config.download_proxy)
                .query(&[("url", url)]),
            DownloadStrategy::Direct => client.get(cache_busted(url)),
        };

        let response = request.send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Successful fetch: the asset bytes plus the declared content type.
#[derive(Debug)]
pub(crate) struct Fetched {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// Where the fallback loop gets its fetch attempts from.
///
/// Production uses [`HttpFetcher`]; tests script per-strategy outcomes.
pub(crate) trait AssetFetcher {
    async fn fetch(&mut self, strategy: DownloadStrategy) -> Result<Fetched, String>;
}

/// Fetches over HTTP, per [`DownloadStrategy`].
struct HttpFetcher<'a> {
    client: &'a reqwest::Client,
    config: &'a GenerationConfig,
    url: &'a str,
}

impl AssetFetcher for HttpFetcher<'_> {
    async fn fetch(&mut self, strategy: DownloadStrategy) -> Result<Fetched, String> {
        strategy.fetch(self.client, self.config, self.url).await
    }
}

/// The fallback loop proper, generic over where attempts go.
///
/// Every strategy in [`STRATEGY_ORDER`] is tried before any failure
/// surfaces; the first success wins. `observe` fires once per failed
/// strategy, with the failure reason.
pub(crate) async fn fetch_with_fallback<F: AssetFetcher>(
    fetcher: &mut F,
    media_url: &str,
    mut observe: impl FnMut(DownloadStrategy, &str),
) -> Result<(DownloadStrategy, Fetched), Img2ArtError> {
    for strategy in STRATEGY_ORDER {
        match fetcher.fetch(strategy).await {
            Ok(f) => return Ok((strategy, f)),
            Err(reason) => {
                warn!(strategy = strategy.as_str(), %reason, "download strategy failed");
                observe(strategy, &reason);
            }
        }
    }
    Err(Img2ArtError::Download {
        url: media_url.to_string(),
    })
}

/// Append a cache-busting `t=<unix millis>` parameter.
pub fn cache_busted(url: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}t={millis}")
}

/// Infer the artifact extension from the declared content type, falling
/// back to the URL, falling back to `png`.
pub fn infer_extension(url: &str, content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if ct.contains("jpeg") || ct.contains("jpg") {
            return "jpg".to_string();
        }
        if ct.contains("png") {
            return "png".to_string();
        }
        if ct.contains("webp") {
            return "webp".to_string();
        }
    }

    if let Some(m) = URL_EXT_RE.captures(url).and_then(|c| c.get(1)) {
        let ext = m.as_str().to_ascii_lowercase();
        return if ext == "jpeg" { "jpg".to_string() } else { ext };
    }

    FALLBACK_EXTENSION.to_string()
}

/// Artifact filename: `vector_art_<8 random alphanumerics>.<ext>`.
pub fn artifact_file_name(extension: &str) -> String {
    format!("vector_art_{}.{}", random_id(ARTIFACT_ID_LEN), extension)
}

/// Download the asset at `media_url` into `out_dir`.
///
/// Tries the strategies in [`STRATEGY_ORDER`]; the first success wins.
/// The file is written atomically (temp name + rename) so a crash never
/// leaves a truncated artifact behind. When every strategy fails the
/// returned [`Img2ArtError::Download`] message tells the user how to save
/// the asset manually.
pub async fn download(
    client: &reqwest::Client,
    config: &GenerationConfig,
    media_url: &str,
    out_dir: impl AsRef<Path>,
) -> Result<SavedArtifact, Img2ArtError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_start(media_url);
    }

    let mut fetcher = HttpFetcher {
        client,
        config,
        url: media_url,
    };
    let (strategy, fetched) = fetch_with_fallback(&mut fetcher, media_url, |strategy, reason| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_download_fallback(strategy.as_str(), reason);
        }
    })
    .await?;

    let extension = infer_extension(media_url, fetched.content_type.as_deref());
    let file_name = artifact_file_name(&extension);
    let path = out_dir.as_ref().join(&file_name);

    write_atomic(&path, &fetched.bytes).await?;

    let artifact = SavedArtifact {
        bytes: fetched.bytes.len() as u64,
        file_name: file_name.clone(),
        extension,
        strategy: strategy.as_str().to_string(),
        path,
    };
    info!(file = %artifact.path.display(), bytes = artifact.bytes, strategy = %artifact.strategy, "artifact saved");

    if let Some(ref cb) = config.progress_callback {
        cb.on_download_complete(&file_name, artifact.bytes);
    }

    Ok(artifact)
}

/// Write to a temp name in the target directory, then rename into place.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Img2ArtError> {
    let io_err = |source: std::io::Error| Img2ArtError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }

    let tmp = path.with_extension("part");
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        proxy: Option<Result<Fetched, String>>,
        direct: Option<Result<Fetched, String>>,
        attempts: Vec<DownloadStrategy>,
    }

    impl Scripted {
        fn new(proxy: Result<Fetched, String>, direct: Result<Fetched, String>) -> Self {
            Self {
                proxy: Some(proxy),
                direct: Some(direct),
                attempts: vec![],
            }
        }
    }

    impl AssetFetcher for Scripted {
        async fn fetch(&mut self, strategy: DownloadStrategy) -> Result<Fetched, String> {
            self.attempts.push(strategy);
            match strategy {
                DownloadStrategy::Proxy => self.proxy.take().expect("proxy fetched at most once"),
                DownloadStrategy::Direct => {
                    self.direct.take().expect("direct fetched at most once")
                }
            }
        }
    }

    fn body(bytes: &[u8], content_type: Option<&str>) -> Result<Fetched, String> {
        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type: content_type.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn proxy_failure_falls_through_to_direct() {
        let mut fetcher = Scripted::new(
            Err("HTTP 502 Bad Gateway".into()),
            body(b"artbytes", Some("image/png")),
        );
        let mut fallbacks = vec![];

        let (strategy, fetched) =
            fetch_with_fallback(&mut fetcher, "https://cdn/out.png", |s, reason| {
                fallbacks.push((s, reason.to_string()))
            })
            .await
            .unwrap();

        assert_eq!(strategy, DownloadStrategy::Direct);
        assert_eq!(fetched.bytes, b"artbytes");
        assert_eq!(fetcher.attempts, vec![DownloadStrategy::Proxy, DownloadStrategy::Direct]);
        assert_eq!(
            fallbacks,
            vec![(DownloadStrategy::Proxy, "HTTP 502 Bad Gateway".to_string())]
        );
    }

    #[tokio::test]
    async fn proxy_success_never_touches_direct() {
        let mut fetcher = Scripted::new(body(b"x", None), Err("unused".into()));
        let mut fallbacks = 0;

        let (strategy, _) =
            fetch_with_fallback(&mut fetcher, "https://cdn/out.png", |_, _| fallbacks += 1)
                .await
                .unwrap();

        assert_eq!(strategy, DownloadStrategy::Proxy);
        assert_eq!(fetcher.attempts, vec![DownloadStrategy::Proxy]);
        assert_eq!(fallbacks, 0, "no fallback events on first-strategy success");
    }

    #[tokio::test]
    async fn both_strategies_failing_surfaces_download_error() {
        let mut fetcher = Scripted::new(Err("HTTP 502".into()), Err("connection refused".into()));
        let mut fallbacks = vec![];

        let err = fetch_with_fallback(&mut fetcher, "https://cdn/out.png", |s, _| {
            fallbacks.push(s)
        })
        .await
        .unwrap_err();

        // Both strategies ran, in order, before any failure surfaced.
        assert_eq!(fetcher.attempts, vec![DownloadStrategy::Proxy, DownloadStrategy::Direct]);
        assert_eq!(fallbacks, vec![DownloadStrategy::Proxy, DownloadStrategy::Direct]);
        match err {
            Img2ArtError::Download { url } => assert_eq!(url, "https://cdn/out.png"),
            other => panic!("expected Download error, got {other}"),
        }
        // The surfaced message tells the user how to recover.
        let msg = Img2ArtError::Download {
            url: "https://cdn/out.png".into(),
        }
        .to_string();
        assert!(msg.contains("save the file manually"), "got: {msg}");
    }

    #[test]
    fn extension_from_content_type_takes_priority() {
        assert_eq!(infer_extension("https://cdn/x.webp", Some("image/png")), "png");
        assert_eq!(infer_extension("https://cdn/x", Some("image/jpeg")), "jpg");
        assert_eq!(infer_extension("https://cdn/x", Some("image/jpg")), "jpg");
        assert_eq!(infer_extension("https://cdn/x", Some("image/webp")), "webp");
    }

    #[test]
    fn extension_from_url_when_content_type_unhelpful() {
        assert_eq!(infer_extension("https://cdn/photo.jpeg", None), "jpg");
        assert_eq!(infer_extension("https://cdn/photo.JPG?v=1", None), "jpg");
        assert_eq!(infer_extension("https://cdn/a.png", Some("binary/octet-stream")), "png");
        assert_eq!(infer_extension("https://cdn/a.webp", None), "webp");
    }

    #[test]
    fn extension_defaults_to_png() {
        assert_eq!(infer_extension("https://cdn/asset", None), "png");
        assert_eq!(infer_extension("https://cdn/asset", Some("application/json")), "png");
    }

    #[test]
    fn cache_buster_uses_correct_separator() {
        let plain = cache_busted("https://cdn/a.png");
        assert!(plain.starts_with("https://cdn/a.png?t="), "got: {plain}");

        let with_query = cache_busted("https://cdn/a.png?v=2");
        assert!(with_query.starts_with("https://cdn/a.png?v=2&t="), "got: {with_query}");
    }

    #[test]
    fn artifact_name_shape() {
        let name = artifact_file_name("jpg");
        let rest = name.strip_prefix("vector_art_").expect("prefix");
        let (id, ext) = rest.split_once('.').unwrap();
        assert_eq!(id.len(), ARTIFACT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn strategy_order_is_proxy_then_direct() {
        assert_eq!(
            STRATEGY_ORDER,
            [DownloadStrategy::Proxy, DownloadStrategy::Direct]
        );
    }

    #[tokio::test]
    async fn write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector_art_abcd1234.png");

        write_atomic(&path, b"bytes").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        assert!(!path.with_extension("part").exists());
    }

    #[tokio::test]
    async fn write_atomic_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/vector_art_x.png");

        write_atomic(&path, b"x").await.unwrap();
        assert!(path.exists());
    }
}
