//! CLI binary for img2art.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use img2art::{
    download_to_dir, generate, generate_to_dir, upload_image, GenerationConfig,
    GenerationProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner through upload and submission,
/// then a poll-budget progress bar until the job completes.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set once the job is submitted

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the full progress-bar style, sized to the poll budget.
    fn activate_bar(&self, max_polls: u32) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} checks  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(max_polls as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, file_name: &str) {
        self.bar.set_prefix("Uploading");
        self.bar.set_message(file_name.to_string());
    }

    fn on_upload_complete(&self, url: &str) {
        self.bar
            .println(format!("{} uploaded to {}", green("✓"), dim(url)));
        self.bar.set_prefix("Submitting");
        self.bar.set_message(String::new());
    }

    fn on_job_submitted(&self, job_id: &str) {
        self.bar
            .println(format!("{} job accepted: {}", cyan("◆"), bold(job_id)));
    }

    fn on_poll(&self, attempt: u32, max: u32, status: &str) {
        if attempt == 1 {
            self.activate_bar(max);
        }
        self.bar.set_position(attempt as u64);
        self.bar.set_message(status.to_string());
    }

    fn on_generation_complete(&self, media_url: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} generation complete: {}", green("✔"), dim(media_url));
    }

    fn on_download_start(&self, _url: &str) {
        self.bar.set_prefix("Downloading");
    }

    fn on_download_fallback(&self, strategy: &str, error: &str) {
        self.bar.println(format!(
            "{} {} download failed ({error}), trying next strategy",
            yellow("⚠"),
            strategy
        ));
    }

    fn on_download_complete(&self, file_name: &str, bytes: u64) {
        eprintln!(
            "{} saved {} {}",
            green("✔"),
            bold(file_name),
            dim(&format!("({bytes} bytes)"))
        );
    }

    fn on_error(&self, _error: &str) {
        // The error itself is printed by main via anyhow.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate vector art from a photo, save next to the shell
  img2art photo.jpg

  # Save into a specific directory
  img2art photo.jpg -o out/

  # Upload only, print the public CDN URL
  img2art --upload-only photo.jpg

  # Generate but skip the download, print the media URL
  img2art --no-download photo.jpg

  # Re-download an already generated asset
  img2art --download-url https://cdn.example/result.png -o out/

  # Structured JSON output for scripting
  img2art --json photo.jpg > result.json

  # Faster polling against a staging deployment
  img2art --gen-api https://staging.example/image-gen --poll-interval-ms 500 photo.jpg

ENVIRONMENT VARIABLES:
  IMG2ART_OUT_DIR         Default output directory
  IMG2ART_EFFECT_ID       Override the effect identifier
  IMG2ART_USER_ID         Override the service user identifier
  IMG2ART_UPLOAD_API      Override the upload-URL signing endpoint
  IMG2ART_GEN_API         Override the generation endpoint
  IMG2ART_DOWNLOAD_PROXY  Override the download proxy endpoint
  IMG2ART_CDN_DOMAIN      Override the CDN origin

TIMING:
  The service is polled every 2 s, up to 60 times (~2 minutes). Tune with
  --poll-interval-ms and --max-polls if your jobs run longer.
"#;

/// Turn photos into vector art via a hosted image-effects service.
#[derive(Parser, Debug)]
#[command(
    name = "img2art",
    version,
    about = "Turn photos into vector art via a hosted image-effects service",
    long_about = "Uploads a local image, submits a vector-art generation job, polls it to \
completion, and downloads the result. Supports JPEG, PNG, WEBP, and GIF inputs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image file to generate from.
    #[arg(required_unless_present = "download_url")]
    input: Option<PathBuf>,

    /// Directory the artifact is written into.
    #[arg(short, long, env = "IMG2ART_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Upload the image and print its public CDN URL, without generating.
    #[arg(long, conflicts_with = "download_url")]
    upload_only: bool,

    /// Generate but skip the download; print the media URL instead.
    #[arg(long, conflicts_with_all = ["upload_only", "download_url"])]
    no_download: bool,

    /// Skip generation: download this already-generated asset URL.
    #[arg(long, value_name = "URL")]
    download_url: Option<String>,

    /// Effect applied by the service.
    #[arg(long, env = "IMG2ART_EFFECT_ID")]
    effect_id: Option<String>,

    /// Service user identifier.
    #[arg(long, env = "IMG2ART_USER_ID")]
    user_id: Option<String>,

    /// Upload-URL signing endpoint.
    #[arg(long, env = "IMG2ART_UPLOAD_API")]
    upload_api: Option<String>,

    /// Generation endpoint (submit + status polls).
    #[arg(long, env = "IMG2ART_GEN_API")]
    gen_api: Option<String>,

    /// Download proxy endpoint.
    #[arg(long, env = "IMG2ART_DOWNLOAD_PROXY")]
    download_proxy: Option<String>,

    /// CDN origin uploads become reachable under.
    #[arg(long, env = "IMG2ART_CDN_DOMAIN")]
    cdn_domain: Option<String>,

    /// Delay between status polls in milliseconds.
    #[arg(long, env = "IMG2ART_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum number of status polls before giving up.
    #[arg(long, env = "IMG2ART_MAX_POLLS", default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "IMG2ART_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, env = "IMG2ART_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMG2ART_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2ART_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final result.
    #[arg(short, long, env = "IMG2ART_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Download-only mode ───────────────────────────────────────────────
    if let Some(ref url) = cli.download_url {
        let artifact = download_to_dir(url, &cli.out_dir, &config)
            .await
            .context("Download failed")?;
        print_artifact_result(&cli, &artifact)?;
        return Ok(());
    }

    // clap guarantees presence unless --download-url handled above.
    let input = cli.input.as_ref().context("an input image path is required")?;

    // ── Upload-only mode ─────────────────────────────────────────────────
    if cli.upload_only {
        let uploaded = upload_image(input, &config).await.context("Upload failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "url": uploaded.url,
                    "fileName": uploaded.file_name,
                })
            );
        } else {
            println!("{}", uploaded.url);
        }
        return Ok(());
    }

    // ── Generate (and usually download) ──────────────────────────────────
    if cli.no_download {
        let output = generate(input, &config).await.context("Generation failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
        } else {
            println!("{}", output.media_url);
            if !cli.quiet {
                eprintln!(
                    "   {} polls  —  {}ms total",
                    dim(&output.stats.polls.to_string()),
                    output.stats.total_ms
                );
            }
        }
        return Ok(());
    }

    let (output, artifact) = generate_to_dir(input, &cli.out_dir, &config)
        .await
        .context("Generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "output": output,
                "artifact": artifact,
            }))
            .context("Failed to serialise output")?
        );
    } else {
        println!("{}", artifact.path.display());
        if !cli.quiet && !show_progress {
            // Only print inline stats when the progress callback is disabled.
            eprintln!(
                "Generated in {}ms ({} polls), downloaded via {}",
                output.stats.total_ms, output.stats.polls, artifact.strategy
            );
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .poll_interval_ms(cli.poll_interval_ms)
        .max_polls(cli.max_polls)
        .http_timeout_secs(cli.timeout);

    if let Some(ref v) = cli.effect_id {
        builder = builder.effect_id(v);
    }
    if let Some(ref v) = cli.user_id {
        builder = builder.user_id(v);
    }
    if let Some(ref v) = cli.upload_api {
        builder = builder.upload_api(v);
    }
    if let Some(ref v) = cli.gen_api {
        builder = builder.gen_api(v);
    }
    if let Some(ref v) = cli.download_proxy {
        builder = builder.download_proxy(v);
    }
    if let Some(ref v) = cli.cdn_domain {
        builder = builder.cdn_domain(v);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print a saved artifact in the requested format.
fn print_artifact_result(cli: &Cli, artifact: &img2art::SavedArtifact) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(artifact).context("Failed to serialise artifact")?
        );
    } else {
        println!("{}", artifact.path.display());
    }
    Ok(())
}
