//! Object storage: metadata lookups, uploads and signed upload URLs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use blusanta_core::storage_paths::parse_storage_url;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::auth::{AccessTokenSource, SCOPE_CLOUD_PLATFORM};
use crate::error::{CloudError, CloudResult};
use crate::http::{ensure_success, parse_response};

const SERVICE: &str = "Cloud Storage";
const DEFAULT_API_BASE: &str = "https://storage.googleapis.com";
const DEFAULT_IAM_BASE: &str = "https://iamcredentials.googleapis.com";
const SIGNING_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";
const SIGNED_HEADERS: &str = "content-type;host";

/// Validity of signed upload URLs handed to the browser.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub updated: Option<String>,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Metadata of an object, `None` when it does not exist.
    async fn metadata(&self, bucket: &str, object: &str) -> CloudResult<Option<ObjectMetadata>>;

    /// Upload bytes, replacing any existing object.
    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> CloudResult<()>;

    /// A URL that lets an unauthenticated client `PUT` the object.
    async fn signed_upload_url(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        ttl: Duration,
    ) -> CloudResult<String>;

    async fn exists(&self, bucket: &str, object: &str) -> CloudResult<bool> {
        Ok(self.metadata(bucket, object).await?.is_some())
    }
}

/// Check existence of an object addressed by `gs://` or public HTTPS URL.
///
/// Unparseable URLs count as missing.
pub async fn url_exists(storage: &dyn ObjectStorage, url: &str) -> CloudResult<bool> {
    match parse_storage_url(url) {
        Ok((bucket, object)) => storage.exists(&bucket, &object).await,
        Err(_) => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Cloud Storage JSON API
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    /// The JSON API encodes `uint64` as a string.
    size: String,
    content_type: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignBlobResponse {
    signed_blob: String,
}

/// [`ObjectStorage`] backed by the Cloud Storage JSON API.
pub struct GcsStorage {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
    iam_base: String,
    /// Service account whose key signs upload URLs via IAM `signBlob`.
    signer_email: Option<String>,
}

impl GcsStorage {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
        signer_email: Option<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            api_base: DEFAULT_API_BASE.to_string(),
            iam_base: DEFAULT_IAM_BASE.to_string(),
            signer_email,
        }
    }

    /// Point the client at a different API host (emulators, tests).
    pub fn with_endpoints(mut self, api_base: &str, iam_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.iam_base = iam_base.trim_end_matches('/').to_string();
        self
    }

    async fn bearer(&self) -> CloudResult<String> {
        self.tokens.access_token(&[SCOPE_CLOUD_PLATFORM]).await
    }

    async fn sign_blob(&self, email: &str, payload: &[u8]) -> CloudResult<Vec<u8>> {
        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{}:signBlob",
            self.iam_base,
            urlencoding::encode(email)
        );
        let body = serde_json::json!({
            "payload": base64::engine::general_purpose::STANDARD.encode(payload),
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(self.bearer().await?)
            .json(&body)
            .send()
            .await?;
        let signed: SignBlobResponse = parse_response("IAM Credentials", response).await?;
        base64::engine::general_purpose::STANDARD
            .decode(signed.signed_blob)
            .map_err(|e| CloudError::Decode {
                service: "IAM Credentials",
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn metadata(&self, bucket: &str, object: &str) -> CloudResult<Option<ObjectMetadata>> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}",
            self.api_base,
            urlencoding::encode(bucket),
            urlencoding::encode(object)
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource: ObjectResource = parse_response(SERVICE, response).await?;
        let size = resource.size.parse().map_err(|_| CloudError::Decode {
            service: SERVICE,
            detail: format!("invalid object size '{}'", resource.size),
        })?;
        Ok(Some(ObjectMetadata {
            name: resource.name,
            size,
            content_type: resource.content_type,
            updated: resource.updated,
        }))
    }

    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> CloudResult<()> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.api_base,
            urlencoding::encode(bucket)
        );
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(self.bearer().await?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        tracing::debug!(bucket, object, "Object uploaded");
        Ok(())
    }

    async fn signed_upload_url(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        ttl: Duration,
    ) -> CloudResult<String> {
        let email = self
            .signer_email
            .as_deref()
            .ok_or(CloudError::Config("GCP_SERVICE_ACCOUNT_EMAIL"))?;
        let request = SignedUrlRequest {
            bucket,
            object,
            content_type,
            signer_email: email,
            now: Utc::now(),
            ttl,
        };
        let signature = self.sign_blob(email, request.string_to_sign().as_bytes()).await?;
        Ok(request.url(&signature))
    }
}

// ---------------------------------------------------------------------------
// V4 signing
// ---------------------------------------------------------------------------

/// Inputs of a V4 signed `PUT` URL.
struct SignedUrlRequest<'a> {
    bucket: &'a str,
    object: &'a str,
    content_type: &'a str,
    signer_email: &'a str,
    now: DateTime<Utc>,
    ttl: Duration,
}

impl SignedUrlRequest<'_> {
    fn datestamp(&self) -> String {
        self.now.format("%Y%m%d").to_string()
    }

    fn timestamp(&self) -> String {
        self.now.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn credential_scope(&self) -> String {
        format!("{}/auto/storage/goog4_request", self.datestamp())
    }

    fn canonical_uri(&self) -> String {
        let object = self
            .object
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/{object}", self.bucket)
    }

    /// Query parameters in sorted order, values percent-encoded.
    fn canonical_query(&self) -> String {
        let credential = format!("{}/{}", self.signer_email, self.credential_scope());
        let params = [
            ("X-Goog-Algorithm", SIGNING_ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", self.timestamp()),
            ("X-Goog-Expires", self.ttl.as_secs().to_string()),
            ("X-Goog-SignedHeaders", SIGNED_HEADERS.to_string()),
        ];
        params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn canonical_request(&self) -> String {
        format!(
            "PUT\n{}\n{}\ncontent-type:{}\nhost:{SIGNING_HOST}\n\n{SIGNED_HEADERS}\nUNSIGNED-PAYLOAD",
            self.canonical_uri(),
            self.canonical_query(),
            self.content_type,
        )
    }

    fn string_to_sign(&self) -> String {
        let digest = Sha256::digest(self.canonical_request().as_bytes());
        format!(
            "{SIGNING_ALGORITHM}\n{}\n{}\n{}",
            self.timestamp(),
            self.credential_scope(),
            hex::encode(digest)
        )
    }

    fn url(&self, signature: &[u8]) -> String {
        format!(
            "https://{SIGNING_HOST}{}?{}&X-Goog-Signature={}",
            self.canonical_uri(),
            self.canonical_query(),
            hex::encode(signature)
        )
    }
}
