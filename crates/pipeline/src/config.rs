use crate::capacity::HostRef;
use crate::error::PipelineError;

const DEFAULT_AVATAR_NAME: &str = "blusanta";
const DEFAULT_BUCKET: &str = "blusanta-campaign-videos";
const DEFAULT_STITCH_HOSTS: &str = "us-central1-a/video-stitch-blusanta";
const DEFAULT_STITCH_HOST_PORT: u16 = 8080;

/// Campaign-wide settings shared by the stages.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Campaign tag stored on every assessment.
    pub avatar_name: String,
    /// Bucket holding templates, generated audio and final videos.
    pub bucket: String,
    pub stitch_hosts: Vec<HostRef>,
    pub stitch_host_port: u16,
    /// Bearer token the stitching hosts expect.
    pub stitch_auth_token: String,
}

impl CampaignConfig {
    /// Load from environment variables.
    ///
    /// | Env var                 | Default                               |
    /// |-------------------------|---------------------------------------|
    /// | `AVATAR_NAME`           | `blusanta`                            |
    /// | `GCS_BUCKET_NAME`       | `blusanta-campaign-videos`            |
    /// | `STITCH_HOSTS`          | `us-central1-a/video-stitch-blusanta` |
    /// | `STITCH_HOST_PORT`      | `8080`                                |
    /// | `AI_SERVICE_AUTH_TOKEN` | required                              |
    pub fn from_env() -> Result<Self, PipelineError> {
        let stitch_hosts = HostRef::parse_list(
            &std::env::var("STITCH_HOSTS").unwrap_or_else(|_| DEFAULT_STITCH_HOSTS.into()),
        )?;

        let stitch_host_port = match std::env::var("STITCH_HOST_PORT") {
            Ok(v) => v
                .parse()
                .map_err(|_| PipelineError::Config(format!("STITCH_HOST_PORT '{v}' is not a port")))?,
            Err(_) => DEFAULT_STITCH_HOST_PORT,
        };

        let stitch_auth_token = std::env::var("AI_SERVICE_AUTH_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PipelineError::Config("AI_SERVICE_AUTH_TOKEN is required".into()))?;

        Ok(Self {
            avatar_name: std::env::var("AVATAR_NAME")
                .unwrap_or_else(|_| DEFAULT_AVATAR_NAME.into()),
            bucket: std::env::var("GCS_BUCKET_NAME").unwrap_or_else(|_| DEFAULT_BUCKET.into()),
            stitch_hosts,
            stitch_host_port,
            stitch_auth_token,
        })
    }
}
