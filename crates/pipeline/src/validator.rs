//! Pre-dispatch existence and size checks for stitching inputs.

use std::sync::Arc;

use blusanta_cloud::storage::ObjectStorage;
use blusanta_cloud::CloudError;
use blusanta_core::error::CoreError;
use blusanta_core::storage_paths::parse_storage_url;
use futures::future::join_all;

const MISSING: &str = "File does not exist";
const EMPTY: &str = "File is empty (0 bytes)";

/// Result of checking one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCheck {
    pub url: String,
    pub error: Option<String>,
    pub size: Option<u64>,
}

impl AssetCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub results: Vec<AssetCheck>,
}

impl ValidationReport {
    pub fn all_valid(&self) -> bool {
        self.results.iter().all(AssetCheck::is_valid)
    }

    /// `"{url} - {error}"` for every failed asset, joined with `"; "`.
    pub fn failure_summary(&self) -> String {
        self.results
            .iter()
            .filter_map(|c| c.error.as_ref().map(|e| format!("{} - {e}", c.url)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks that every asset exists and is non-empty, concurrently.
pub struct AssetValidator {
    storage: Arc<dyn ObjectStorage>,
}

impl AssetValidator {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Check all `urls`.
    ///
    /// Problems with individual assets are reported per asset. An error is
    /// returned only when storage cannot be queried at all (credentials or
    /// configuration).
    pub async fn validate(&self, urls: &[String]) -> Result<ValidationReport, CloudError> {
        let checks = join_all(urls.iter().map(|url| self.check(url))).await;
        let results = checks.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(ValidationReport { results })
    }

    async fn check(&self, url: &str) -> Result<AssetCheck, CloudError> {
        let failed = |error: String| AssetCheck {
            url: url.to_string(),
            error: Some(error),
            size: None,
        };

        let (bucket, object) = match parse_storage_url(url) {
            Ok(parts) => parts,
            Err(CoreError::Validation(msg)) => return Ok(failed(msg)),
            Err(e) => return Ok(failed(e.to_string())),
        };

        match self.storage.metadata(&bucket, &object).await {
            Ok(None) => Ok(failed(MISSING.to_string())),
            Ok(Some(meta)) if meta.size == 0 => Ok(AssetCheck {
                size: Some(0),
                ..failed(EMPTY.to_string())
            }),
            Ok(Some(meta)) => Ok(AssetCheck {
                url: url.to_string(),
                error: None,
                size: Some(meta.size),
            }),
            Err(e @ (CloudError::Auth(_) | CloudError::Config(_))) => Err(e),
            Err(e) => Ok(failed(e.to_string())),
        }
    }
}
