//! Access tokens for Google APIs.

use std::sync::Arc;

use async_trait::async_trait;
use gcp_auth::TokenProvider;

use crate::error::CloudResult;

pub const SCOPE_CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Source of OAuth bearer tokens.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self, scopes: &[&str]) -> CloudResult<String>;
}

/// Application-default credentials via `gcp_auth`.
///
/// The underlying provider caches tokens until shortly before expiry, so
/// calling [`AccessTokenSource::access_token`] per request is fine.
pub struct GcpTokenSource {
    provider: Arc<dyn TokenProvider>,
}

impl GcpTokenSource {
    /// Discover credentials from the environment (service account file,
    /// metadata server or gcloud user credentials).
    pub async fn discover() -> CloudResult<Self> {
        let provider = gcp_auth::provider().await?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl AccessTokenSource for GcpTokenSource {
    async fn access_token(&self, scopes: &[&str]) -> CloudResult<String> {
        let token = self.provider.token(scopes).await?;
        Ok(token.as_str().to_string())
    }
}

/// A fixed token. Used against emulators and in tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self, _scopes: &[&str]) -> CloudResult<String> {
        Ok(self.0.clone())
    }
}
