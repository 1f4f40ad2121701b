//! Submit stage: start a generation job for an uploaded image.

use crate::config::GenerationConfig;
use crate::error::Img2ArtError;
use crate::pipeline::poll::JobStatus;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Wire payload of the generation-submit POST.
///
/// Field names and the two fixed flags are part of the service contract;
/// everything except `image_url` comes straight from the config.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    model: &'a str,
    tool_type: &'a str,
    effect_id: &'a str,
    image_url: &'a str,
    user_id: &'a str,
    remove_watermark: bool,
    is_private: bool,
}

/// The accepted job, as returned by the submit endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    /// Server-assigned job identifier, used for all status polls.
    pub job_id: String,
    /// Initial status, normally `queued`.
    #[serde(default)]
    pub status: JobStatus,
}

/// POST the generation request and return the accepted job ticket.
///
/// Fails with [`Img2ArtError::Submission`] on a non-success HTTP status
/// or an unparseable response body.
pub async fn submit(
    client: &reqwest::Client,
    config: &GenerationConfig,
    image_url: &str,
) -> Result<JobTicket, Img2ArtError> {
    let body = SubmitRequest {
        model: &config.model,
        tool_type: &config.tool_type,
        effect_id: &config.effect_id,
        image_url,
        user_id: &config.user_id,
        remove_watermark: true,
        is_private: true,
    };

    let response = client
        .post(&config.gen_api)
        .json(&body)
        .send()
        .await
        .map_err(|e| Img2ArtError::Submission {
            detail: format!("request failed: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(Img2ArtError::Submission {
            detail: format!("HTTP {}", response.status()),
        });
    }

    let ticket: JobTicket = response.json().await.map_err(|e| Img2ArtError::Submission {
        detail: format!("unparseable response: {e}"),
    })?;

    info!(job_id = %ticket.job_id, status = ticket.status.as_str(), "job submitted");

    if let Some(ref cb) = config.progress_callback {
        cb.on_job_submitted(&ticket.job_id);
    }

    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialises_with_camel_case_wire_names() {
        let body = SubmitRequest {
            model: "image-effects",
            tool_type: "image-effects",
            effect_id: "photoToVectorArt",
            image_url: "https://cdn.example/a.jpg",
            user_id: "u1",
            remove_watermark: true,
            is_private: true,
        };

        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "image-effects");
        assert_eq!(v["toolType"], "image-effects");
        assert_eq!(v["effectId"], "photoToVectorArt");
        assert_eq!(v["imageUrl"], "https://cdn.example/a.jpg");
        assert_eq!(v["userId"], "u1");
        assert_eq!(v["removeWatermark"], true);
        assert_eq!(v["isPrivate"], true);
        assert_eq!(v.as_object().unwrap().len(), 7, "no stray fields");
    }

    #[test]
    fn ticket_deserialises_with_and_without_status() {
        let t: JobTicket =
            serde_json::from_str(r#"{"jobId":"j1","status":"queued","eta":12}"#).unwrap();
        assert_eq!(t.job_id, "j1");
        assert_eq!(t.status, JobStatus::Queued);

        let t: JobTicket = serde_json::from_str(r#"{"jobId":"j2"}"#).unwrap();
        assert_eq!(t.job_id, "j2");
        assert_eq!(t.status, JobStatus::Queued);
    }
}
