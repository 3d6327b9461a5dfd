//! Asynchronous video rendering collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;

/// Statuses that end a render successfully.
pub const COMPLETED_STATUSES: [&str; 3] = ["completed", "done", "ready"];
/// Statuses that end a render with a failure.
pub const FAILED_STATUSES: [&str; 2] = ["failed", "error"];

/// A render submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRequest {
    /// Text spoken in the video.
    pub script: String,
    /// Avatar to render with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    /// Product image shown in the video.
    #[serde(rename = "media_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Visual style preset.
    pub visual_style: &'static str,
}

/// Reply to a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    /// Remote job id; absent on malformed replies.
    #[serde(default)]
    pub id: Option<String>,
}

/// Reply to a status request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenderStatus {
    /// Raw status string.
    #[serde(default)]
    pub status: String,
    /// Final video location.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Alternate field some responses use for the video location.
    #[serde(default)]
    pub output_url: Option<String>,
    /// Rendered runtime in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Failure reason.
    #[serde(default)]
    pub error: Option<String>,
}

impl RenderStatus {
    /// Creates a status with only the status string set.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }

    /// Sets the video URL.
    #[must_use]
    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    /// Returns true for a successful terminal status.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        COMPLETED_STATUSES.contains(&self.normalized().as_str())
    }

    /// Returns true for a failed terminal status.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        FAILED_STATUSES.contains(&self.normalized().as_str())
    }

    /// The video location, preferring `video_url` over `output_url`.
    #[must_use]
    pub fn resolved_url(&self) -> Option<&str> {
        self.video_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.output_url.as_deref().filter(|u| !u.is_empty()))
    }

    fn normalized(&self) -> String {
        self.status.trim().to_ascii_lowercase()
    }
}

/// Submit-then-poll video rendering.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Submits a render and returns the raw reply.
    async fn submit(&self, request: &RenderRequest) -> Result<SubmitResponse, RemoteError>;

    /// Requests the current status of a job.
    async fn status(&self, job_id: &str) -> Result<RenderStatus, RemoteError>;
}

#[cfg(feature = "http")]
pub use client::CreatifyClient;

#[cfg(feature = "http")]
mod client {
    use super::{RenderRequest, RenderStatus, SubmitResponse, VideoRenderer};
    use crate::collaborators::http::{parse_json, read_body};
    use crate::errors::RemoteError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Creatify-style rendering API client.
    #[derive(Debug, Clone)]
    pub struct CreatifyClient {
        api_base: String,
        api_key: String,
        client: reqwest::Client,
        status_timeout: Duration,
    }

    impl CreatifyClient {
        /// Creates a client. `submit_timeout` bounds submissions,
        /// `status_timeout` bounds each status request.
        pub fn new(
            api_base: impl Into<String>,
            api_key: impl Into<String>,
            submit_timeout: Duration,
            status_timeout: Duration,
        ) -> Result<Self, RemoteError> {
            Ok(Self {
                api_base: api_base.into().trim_end_matches('/').to_string(),
                api_key: api_key.into(),
                client: crate::collaborators::http::client(submit_timeout)?,
                status_timeout,
            })
        }
    }

    #[async_trait]
    impl VideoRenderer for CreatifyClient {
        async fn submit(&self, request: &RenderRequest) -> Result<SubmitResponse, RemoteError> {
            let response = self
                .client
                .post(format!("{}/videos", self.api_base))
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await?;
            parse_json(&read_body(response).await?)
        }

        async fn status(&self, job_id: &str) -> Result<RenderStatus, RemoteError> {
            let response = self
                .client
                .get(format!("{}/videos/{job_id}", self.api_base))
                .bearer_auth(&self.api_key)
                .timeout(self.status_timeout)
                .send()
                .await?;
            parse_json(&read_body(response).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(RenderStatus::new("completed").is_completed());
        assert!(RenderStatus::new("READY").is_completed());
        assert!(RenderStatus::new("error").is_failed());
        let pending = RenderStatus::new("pending");
        assert!(!pending.is_completed());
        assert!(!pending.is_failed());
    }

    #[test]
    fn test_resolved_url_falls_back() {
        let status: RenderStatus = serde_json::from_str(
            r#"{"status": "done", "video_url": "", "output_url": "https://cdn.example.com/v.mp4"}"#,
        )
        .unwrap();
        assert_eq!(status.resolved_url(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(
            RenderStatus::new("done").with_video_url("a.mp4").resolved_url(),
            Some("a.mp4")
        );
        assert_eq!(RenderStatus::new("done").resolved_url(), None);
    }

    #[test]
    fn test_render_request_shape() {
        let request = RenderRequest {
            script: "Hello".to_string(),
            avatar_id: None,
            image_url: Some("https://cdn.example.com/p.jpg".to_string()),
            visual_style: "ugc",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["media_url"], "https://cdn.example.com/p.jpg");
        assert!(json.get("avatar_id").is_none());
    }
}
