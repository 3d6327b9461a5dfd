//! Shared response handling for the reqwest-backed collaborators.

use std::time::Duration;

use crate::errors::RemoteError;

/// Reads a response body, turning non-success statuses into [`RemoteError::Status`].
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, RemoteError> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.map_err(RemoteError::from)?;

    if !(200..300).contains(&status) {
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.chars().take(500).collect()
        };
        return Err(RemoteError::Status {
            status,
            retry_after,
            message,
        });
    }
    Ok(body)
}

/// Parses a JSON body into `T`, classifying failures as malformed.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::malformed(format!("invalid JSON: {e}")))
}

/// Builds a client with a default per-request deadline.
pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("adflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RemoteError::Transport(e.to_string()))
}
