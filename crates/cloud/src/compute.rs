//! Stitching host power state via the Compute Engine API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::{AccessTokenSource, SCOPE_CLOUD_PLATFORM};
use crate::error::CloudResult;
use crate::http::{ensure_success, parse_response};

const SERVICE: &str = "Compute Engine";
const DEFAULT_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Lifecycle state of a VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Provisioning,
    Staging,
    Running,
    Stopping,
    Suspending,
    Suspended,
    Terminated,
    Repairing,
    Unknown,
}

impl InstanceState {
    pub fn parse(status: &str) -> Self {
        match status {
            "PROVISIONING" => Self::Provisioning,
            "STAGING" => Self::Staging,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "SUSPENDING" => Self::Suspending,
            "SUSPENDED" => Self::Suspended,
            "TERMINATED" => Self::Terminated,
            "REPAIRING" => Self::Repairing,
            _ => Self::Unknown,
        }
    }

    /// Running or fully stopped. Every other state is a transition to wait out.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Running | Self::Terminated)
    }
}

#[async_trait]
pub trait ComputeProvider: Send + Sync {
    async fn instance_state(&self, zone: &str, name: &str) -> CloudResult<InstanceState>;

    /// Request a start. Returns once the operation is accepted, not when the
    /// instance is running.
    async fn start_instance(&self, zone: &str, name: &str) -> CloudResult<()>;

    /// First NAT address of the instance, `None` when it has none.
    async fn external_ip(&self, zone: &str, name: &str) -> CloudResult<Option<String>>;
}

// ---------------------------------------------------------------------------
// Compute Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    status: String,
    #[serde(default)]
    network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkInterface {
    #[serde(default)]
    access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessConfig {
    #[serde(rename = "natIP")]
    nat_ip: Option<String>,
}

impl Instance {
    fn external_ip(self) -> Option<String> {
        self.network_interfaces
            .into_iter()
            .flat_map(|ni| ni.access_configs)
            .find_map(|ac| ac.nat_ip)
    }
}

pub struct GceCompute {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    project_id: String,
    api_base: String,
}

impl GceCompute {
    pub fn new(client: reqwest::Client, tokens: Arc<dyn AccessTokenSource>, project_id: String) -> Self {
        Self {
            client,
            tokens,
            project_id,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn instance_url(&self, zone: &str, name: &str) -> String {
        format!(
            "{}/projects/{}/zones/{zone}/instances/{name}",
            self.api_base, self.project_id
        )
    }

    async fn get_instance(&self, zone: &str, name: &str) -> CloudResult<Instance> {
        let token = self.tokens.access_token(&[SCOPE_CLOUD_PLATFORM]).await?;
        let response = self
            .client
            .get(self.instance_url(zone, name))
            .bearer_auth(token)
            .send()
            .await?;
        parse_response(SERVICE, response).await
    }
}

#[async_trait]
impl ComputeProvider for GceCompute {
    async fn instance_state(&self, zone: &str, name: &str) -> CloudResult<InstanceState> {
        let instance = self.get_instance(zone, name).await?;
        Ok(InstanceState::parse(&instance.status))
    }

    async fn start_instance(&self, zone: &str, name: &str) -> CloudResult<()> {
        let token = self.tokens.access_token(&[SCOPE_CLOUD_PLATFORM]).await?;
        let response = self
            .client
            .post(format!("{}/start", self.instance_url(zone, name)))
            .bearer_auth(token)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        tracing::info!(zone, instance = name, "Instance start requested");
        Ok(())
    }

    async fn external_ip(&self, zone: &str, name: &str) -> CloudResult<Option<String>> {
        Ok(self.get_instance(zone, name).await?.external_ip())
    }
}
