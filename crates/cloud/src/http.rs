//! Response helpers shared by the provider clients.

use crate::error::{CloudError, CloudResult};

/// Return the response unchanged on 2xx, otherwise a [`CloudError::Api`]
/// carrying the status and body text.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> CloudResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(CloudError::Api {
            service,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> CloudResult<T> {
    let response = ensure_success(service, response).await?;
    Ok(response.json::<T>().await?)
}

/// Read a required environment variable.
pub(crate) fn required_env(name: &'static str) -> CloudResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(CloudError::Config(name))
}
