//! REST API client for a stitching host.
//!
//! Wraps the host's HTTP API (status probe and job submission) using
//! [`reqwest`].

use serde::Deserialize;

use crate::payload::StitchingJobPayload;

/// HTTP client for a single stitching host.
pub struct StitcherApi {
    client: reqwest::Client,
    api_url: String,
    auth_token: String,
}

/// Body of `GET /status`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Whether a host can accept a job right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Free,
    Busy,
}

impl From<&StatusResponse> for HostStatus {
    fn from(resp: &StatusResponse) -> Self {
        if resp.status == "free" {
            Self::Free
        } else {
            Self::Busy
        }
    }
}

/// Errors from the stitching host REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum StitcherApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host returned a non-2xx status code.
    #[error("Stitching host error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl StitcherApiError {
    /// The host answered and refused the job.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }
}

impl StitcherApi {
    /// Create an API client reusing an existing [`reqwest::Client`].
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://10.0.0.5:8080`.
    /// * `auth_token` - Bearer token shared with the host.
    pub fn with_client(client: reqwest::Client, api_url: String, auth_token: String) -> Self {
        Self {
            client,
            api_url,
            auth_token,
        }
    }

    /// Query whether the host is idle.
    ///
    /// Sends `GET /status`. Any status other than `"free"` counts as busy.
    pub async fn status(&self) -> Result<HostStatus, StitcherApiError> {
        let response = self
            .client
            .get(format!("{}/status", self.api_url))
            .bearer_auth(&self.auth_token)
            .send()
            .await?;

        let body: StatusResponse = Self::parse_response(response).await?;
        Ok(HostStatus::from(&body))
    }

    /// Submit a stitching job.
    ///
    /// Sends `POST /stitching` with the payload. The host acknowledges
    /// immediately and reports completion through the payload's webhook.
    pub async fn submit(&self, payload: &StitchingJobPayload) -> Result<(), StitcherApiError> {
        let response = self
            .client
            .post(format!("{}/stitching", self.api_url))
            .bearer_auth(&self.auth_token)
            .json(payload)
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`StitcherApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StitcherApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StitcherApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StitcherApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StitcherApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
