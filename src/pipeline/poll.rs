//! Poll stage: re-fetch job status until a terminal state.
//!
//! The service offers no push channel; completion is observed by GETting
//! the status endpoint on a fixed cadence. The loop is deliberately
//! intolerant: a single non-success HTTP response aborts the job rather
//! than masking a flapping backend behind retries, matching the service's
//! own client.
//!
//! The loop itself is written against the small [`StatusSource`] seam so
//! its timing and termination rules can be tested under `tokio`'s paused
//! clock without a live endpoint.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Job lifecycle states as reported by the service.
///
/// `Other` tolerates wire values this client does not know about; unknown
/// states are treated as non-terminal and polled through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Error,
    #[serde(untagged)]
    Other(String),
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Queued
    }
}

impl JobStatus {
    /// A terminal status permits no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Error
        )
    }

    /// Wire representation, as sent by the service.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Other(s) => s,
        }
    }
}

/// One status response, with the fields this client reads pulled out and
/// everything else retained in `extra` so the terminal payload survives
/// round-tripping into [`crate::output::GenerationOutput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: JobStatus,
    /// Result item or ordered sequence of items; present once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Service-provided failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Where the poll loop gets its status payloads from.
///
/// Production uses [`HttpStatusSource`]; tests script a sequence.
pub(crate) trait StatusSource {
    async fn fetch(&mut self) -> Result<StatusPayload, Img2ArtError>;
}

/// GETs `{gen_api}/{user_id}/{job_id}/status`.
pub(crate) struct HttpStatusSource<'a> {
    client: &'a reqwest::Client,
    url: String,
}

impl StatusSource for HttpStatusSource<'_> {
    async fn fetch(&mut self) -> Result<StatusPayload, Img2ArtError> {
        fetch_status_url(self.client, &self.url).await
    }
}

/// One status GET against a fully formed status URL.
pub(crate) async fn fetch_status_url(
    client: &reqwest::Client,
    url: &str,
) -> Result<StatusPayload, Img2ArtError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Img2ArtError::Poll {
            detail: format!("status request failed: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(Img2ArtError::Poll {
            detail: format!("status request returned HTTP {}", response.status()),
        });
    }

    response.json().await.map_err(|e| Img2ArtError::Poll {
        detail: format!("unparseable status response: {e}"),
    })
}

/// Poll the job until a terminal status, returning the terminal payload
/// and the number of polls performed.
///
/// Budget: `config.max_polls` checks, `config.poll_interval_ms` between
/// non-terminal responses. `completed` returns; `failed`/`error` becomes
/// [`Img2ArtError::Job`] with the service message; an exhausted budget
/// becomes [`Img2ArtError::PollTimeout`].
pub async fn poll_until_terminal(
    client: &reqwest::Client,
    config: &GenerationConfig,
    job_id: &str,
) -> Result<(StatusPayload, u32), Img2ArtError> {
    let mut source = HttpStatusSource {
        client,
        url: config.status_url(job_id),
    };
    drive(&mut source, config, |attempt, status| {
        debug!(attempt, status, job_id, "poll");
        if let Some(ref cb) = config.progress_callback {
            cb.on_poll(attempt, config.max_polls, status);
        }
    })
    .await
}

/// The poll loop proper, generic over where payloads come from.
///
/// Sleeps only *between* polls: a terminal response on poll N has waited
/// exactly N-1 intervals.
pub(crate) async fn drive<S: StatusSource>(
    source: &mut S,
    config: &GenerationConfig,
    mut observe: impl FnMut(u32, &str),
) -> Result<(StatusPayload, u32), Img2ArtError> {
    let interval = Duration::from_millis(config.poll_interval_ms);

    for attempt in 1..=config.max_polls {
        if attempt > 1 {
            sleep(interval).await;
        }

        let payload = source.fetch().await?;
        observe(attempt, payload.status.as_str());

        match payload.status {
            JobStatus::Completed => return Ok((payload, attempt)),
            JobStatus::Failed | JobStatus::Error => {
                let message = payload
                    .error
                    .unwrap_or_else(|| "Job processing failed".to_string());
                warn!(%message, "job reported failure");
                return Err(Img2ArtError::Job { message });
            }
            _ => {}
        }
    }

    Err(Img2ArtError::PollTimeout {
        attempts: config.max_polls,
        waited_secs: (config.max_polls as u64).saturating_sub(1) * config.poll_interval_ms / 1000,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    struct Scripted {
        payloads: std::vec::IntoIter<Result<StatusPayload, Img2ArtError>>,
        fetches: u32,
    }

    impl Scripted {
        fn new(items: Vec<Result<StatusPayload, Img2ArtError>>) -> Self {
            Self {
                payloads: items.into_iter(),
                fetches: 0,
            }
        }
    }

    impl StatusSource for Scripted {
        async fn fetch(&mut self) -> Result<StatusPayload, Img2ArtError> {
            self.fetches += 1;
            self.payloads
                .next()
                .unwrap_or_else(|| Ok(with_status(JobStatus::Processing)))
        }
    }

    fn with_status(status: JobStatus) -> StatusPayload {
        StatusPayload {
            status,
            ..Default::default()
        }
    }

    fn test_config(max_polls: u32) -> GenerationConfig {
        GenerationConfig::builder()
            .max_polls(max_polls)
            .poll_interval_ms(2000)
            .build()
            .unwrap()
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Other("warming".into()).is_terminal());
    }

    #[test]
    fn status_deserialises_from_wire_names() {
        let p: StatusPayload = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(p.status, JobStatus::Processing);

        let p: StatusPayload =
            serde_json::from_str(r#"{"status":"rendering","jobId":"j1"}"#).unwrap();
        assert_eq!(p.status, JobStatus::Other("rendering".into()));
        assert_eq!(p.extra["jobId"], "j1");
    }

    #[test]
    fn missing_status_defaults_to_queued() {
        let p: StatusPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.status, JobStatus::Queued);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_third_payload_after_two_intervals() {
        let mut source = Scripted::new(vec![
            Ok(with_status(JobStatus::Queued)),
            Ok(with_status(JobStatus::Processing)),
            Ok(StatusPayload {
                status: JobStatus::Completed,
                result: Some(serde_json::json!({"mediaUrl": "https://cdn/x.png"})),
                ..Default::default()
            }),
        ]);
        let config = test_config(60);
        let start = Instant::now();

        let mut seen = vec![];
        let (payload, polls) = drive(&mut source, &config, |a, s| seen.push((a, s.to_string())))
            .await
            .unwrap();

        assert_eq!(polls, 3);
        assert_eq!(payload.status, JobStatus::Completed);
        assert_eq!(payload.result.unwrap()["mediaUrl"], "https://cdn/x.png");
        // Exactly two 2000 ms waits: before polls 2 and 3, none after.
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
        assert_eq!(
            seen,
            vec![
                (1, "queued".to_string()),
                (2, "processing".to_string()),
                (3, "completed".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_terminal_status() {
        let mut source = Scripted::new(vec![Ok(with_status(JobStatus::Completed))]);
        let config = test_config(60);

        let (_, polls) = drive(&mut source, &config, |_, _| {}).await.unwrap();
        assert_eq!(polls, 1);
        assert_eq!(source.fetches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_carries_service_message() {
        let mut source = Scripted::new(vec![Ok(StatusPayload {
            status: JobStatus::Failed,
            error: Some("nsfw input".into()),
            ..Default::default()
        })]);
        let config = test_config(60);

        let err = drive(&mut source, &config, |_, _| {}).await.unwrap_err();
        match err {
            Img2ArtError::Job { message } => assert_eq!(message, "nsfw input"),
            other => panic!("expected Job error, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_without_message_uses_generic_one() {
        let mut source = Scripted::new(vec![Ok(with_status(JobStatus::Error))]);
        let config = test_config(60);

        let err = drive(&mut source, &config, |_, _| {}).await.unwrap_err();
        match err {
            Img2ArtError::Job { message } => assert_eq!(message, "Job processing failed"),
            other => panic!("expected Job error, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_times_out_at_exactly_max_polls() {
        let mut source = Scripted::new(vec![]); // every fetch yields `processing`
        let config = test_config(60);

        let err = drive(&mut source, &config, |_, _| {}).await.unwrap_err();
        assert_eq!(source.fetches, 60, "must not exceed the poll budget");
        assert!(matches!(
            err,
            Img2ArtError::PollTimeout { attempts: 60, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn http_failure_aborts_immediately() {
        let mut source = Scripted::new(vec![
            Ok(with_status(JobStatus::Queued)),
            Err(Img2ArtError::Poll {
                detail: "status request returned HTTP 502".into(),
            }),
        ]);
        let config = test_config(60);

        let err = drive(&mut source, &config, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, Img2ArtError::Poll { .. }), "{err}");
        assert_eq!(source.fetches, 2, "no further polls after an HTTP error");
    }
}
