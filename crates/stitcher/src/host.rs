//! Host-addressed access to stitching hosts.

use async_trait::async_trait;

use crate::api::{HostStatus, StitcherApi, StitcherApiError};
use crate::payload::StitchingJobPayload;

/// Talks to stitching hosts by address.
#[async_trait]
pub trait StitchHost: Send + Sync {
    /// `true` only when the host answers and reports itself free.
    async fn is_free(&self, ip: &str) -> bool;

    async fn submit(&self, ip: &str, payload: &StitchingJobPayload)
        -> Result<(), StitcherApiError>;
}

/// [`StitchHost`] over HTTP on a fixed port.
pub struct HttpStitchHost {
    client: reqwest::Client,
    port: u16,
    auth_token: String,
}

impl HttpStitchHost {
    pub fn new(client: reqwest::Client, port: u16, auth_token: String) -> Self {
        Self {
            client,
            port,
            auth_token,
        }
    }

    fn api(&self, ip: &str) -> StitcherApi {
        StitcherApi::with_client(
            self.client.clone(),
            format!("http://{ip}:{}", self.port),
            self.auth_token.clone(),
        )
    }
}

#[async_trait]
impl StitchHost for HttpStitchHost {
    async fn is_free(&self, ip: &str) -> bool {
        match self.api(ip).status().await {
            Ok(status) => status == HostStatus::Free,
            Err(e) => {
                tracing::warn!(ip, error = %e, "Stitching host status probe failed");
                false
            }
        }
    }

    async fn submit(
        &self,
        ip: &str,
        payload: &StitchingJobPayload,
    ) -> Result<(), StitcherApiError> {
        self.api(ip).submit(payload).await
    }
}
