//! Streaming status API: observe a job poll by poll.
//!
//! ## Why stream?
//!
//! Generations take up to two minutes. A stream-based API lets callers
//! surface each status transition as it happens, drive their own UI, or
//! apply their own cancellation, instead of blocking inside
//! [`crate::generate::generate`] until the terminal state.
//!
//! [`watch_job`] yields one [`JobUpdate`] per status poll, on the same
//! cadence and with the same poll budget as the eager API. The stream ends
//! after the first terminal update, after the first poll error, or when
//! the budget runs out (the last update's status then tells the caller
//! the job was still in flight).

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::generate::http_client;
use crate::pipeline::poll::{fetch_status_url, StatusPayload};
use futures::stream;
use std::pin::Pin;
use tokio_stream::Stream;
use tokio::time::{sleep, Duration};
use tracing::info;

/// A boxed stream of job updates.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<JobUpdate, Img2ArtError>> + Send>>;

/// One observed status poll.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    /// 1-based poll number.
    pub attempt: u32,
    /// The status payload as returned by this poll.
    pub payload: StatusPayload,
}

impl JobUpdate {
    /// Wire name of the observed status.
    pub fn status(&self) -> &str {
        self.payload.status.as_str()
    }

    /// Whether this update is the job's final state.
    pub fn is_terminal(&self) -> bool {
        self.payload.status.is_terminal()
    }
}

/// Watch a submitted job, yielding one update per status poll.
///
/// # Example
/// ```rust,no_run
/// use img2art::{watch_job, GenerationConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GenerationConfig::default();
/// let mut updates = watch_job("job-42", &config)?;
/// while let Some(update) = updates.next().await {
///     let update = update?;
///     println!("poll {}: {}", update.attempt, update.status());
/// }
/// # Ok(())
/// # }
/// ```
pub fn watch_job(job_id: &str, config: &GenerationConfig) -> Result<UpdateStream, Img2ArtError> {
    info!(job_id, "watching job");
    let source = ClientSource {
        client: http_client(config)?,
        url: config.status_url(job_id),
    };
    Ok(Box::pin(updates(
        source,
        Duration::from_millis(config.poll_interval_ms),
        config.max_polls,
    )))
}

/// Owned status fetcher backing [`watch_job`]; the stream outlives the
/// config it was built from.
struct ClientSource {
    client: reqwest::Client,
    url: String,
}

impl ClientSource {
    async fn fetch(&mut self) -> Result<StatusPayload, Img2ArtError> {
        fetch_status_url(&self.client, &self.url).await
    }
}

struct WatchState<S> {
    source: S,
    interval: Duration,
    max_polls: u32,
    attempt: u32,
    done: bool,
}

/// The update stream proper. Sleeps only between polls, mirroring the
/// eager poll loop, so a stream that ends on poll N has waited exactly
/// N-1 intervals.
fn updates(
    source: ClientSource,
    interval: Duration,
    max_polls: u32,
) -> impl Stream<Item = Result<JobUpdate, Img2ArtError>> + Send {
    let state = WatchState {
        source,
        interval,
        max_polls,
        attempt: 0,
        done: false,
    };
    stream::unfold(state, |mut st| async move {
        if st.done || st.attempt >= st.max_polls {
            return None;
        }
        st.attempt += 1;
        if st.attempt > 1 {
            sleep(st.interval).await;
        }
        let item = match st.source.fetch().await {
            Ok(payload) => {
                if payload.status.is_terminal() {
                    st.done = true;
                }
                Ok(JobUpdate {
                    attempt: st.attempt,
                    payload,
                })
            }
            Err(e) => {
                st.done = true;
                Err(e)
            }
        };
        Some((item, st))
    })
}
