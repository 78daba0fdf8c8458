//! Keeps stitching hosts powered on and resolves their addresses.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use blusanta_cloud::compute::{ComputeProvider, InstanceState};
use futures::future::join_all;

use crate::error::PipelineError;

/// A configured stitching host, `zone/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRef {
    pub zone: String,
    pub name: String,
}

impl HostRef {
    /// Parse a comma-separated `zone/name` list.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, PipelineError> {
        let hosts = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Self>, _>>()?;
        if hosts.is_empty() {
            return Err(PipelineError::Config(
                "at least one stitching host is required".into(),
            ));
        }
        Ok(hosts)
    }
}

impl FromStr for HostRef {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((zone, name)) if !zone.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    zone: zone.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(PipelineError::Config(format!(
                "invalid stitching host '{s}', expected zone/name"
            ))),
        }
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.zone, self.name)
    }
}

/// How long to wait for instance state changes.
#[derive(Debug, Clone)]
pub struct CapacityTimings {
    pub state_poll: Duration,
    pub state_timeout: Duration,
}

impl Default for CapacityTimings {
    fn default() -> Self {
        Self {
            state_poll: Duration::from_secs(5),
            state_timeout: Duration::from_secs(5 * 60),
        }
    }
}

pub struct CapacityManager {
    compute: Arc<dyn ComputeProvider>,
    hosts: Vec<HostRef>,
    timings: CapacityTimings,
}

impl CapacityManager {
    pub fn new(
        compute: Arc<dyn ComputeProvider>,
        hosts: Vec<HostRef>,
        timings: CapacityTimings,
    ) -> Self {
        Self {
            compute,
            hosts,
            timings,
        }
    }

    /// Start every stopped host, wait until all are running, and return the
    /// external addresses of those that have one.
    ///
    /// Hosts that fail are logged and left out. Errors only when no host
    /// is usable.
    pub async fn ensure_running(&self) -> Result<Vec<String>, PipelineError> {
        let results = join_all(self.hosts.iter().map(|h| self.ensure_host(h))).await;

        let mut addresses = Vec::with_capacity(results.len());
        let mut last_error = None;
        for (host, result) in self.hosts.iter().zip(results) {
            match result {
                Ok(Some(ip)) => addresses.push(ip),
                Ok(None) => {
                    tracing::warn!(host = %host, "Stitching host has no external IP, skipping");
                }
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "Failed to bring up stitching host");
                    last_error = Some(e);
                }
            }
        }

        if addresses.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                PipelineError::Capacity("no stitching host has an external IP".into())
            }));
        }
        tracing::info!(hosts = ?addresses, "Stitching hosts ready");
        Ok(addresses)
    }

    async fn ensure_host(&self, host: &HostRef) -> Result<Option<String>, PipelineError> {
        let mut state = self.compute.instance_state(&host.zone, &host.name).await?;

        if !state.is_settled() {
            tracing::info!(host = %host, ?state, "Waiting for stitching host to settle");
            state = self.wait_for(host, InstanceState::is_settled).await?;
        }

        if state == InstanceState::Terminated {
            tracing::info!(host = %host, "Starting stitching host");
            self.compute.start_instance(&host.zone, &host.name).await?;
            self.wait_for(host, |s| s == InstanceState::Running).await?;
            tracing::info!(host = %host, "Stitching host running");
        }

        Ok(self.compute.external_ip(&host.zone, &host.name).await?)
    }

    async fn wait_for(
        &self,
        host: &HostRef,
        done: impl Fn(InstanceState) -> bool,
    ) -> Result<InstanceState, PipelineError> {
        let deadline = tokio::time::Instant::now() + self.timings.state_timeout;
        loop {
            tokio::time::sleep(self.timings.state_poll).await;
            let state = self.compute.instance_state(&host.zone, &host.name).await?;
            if done(state) {
                return Ok(state);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PipelineError::Capacity(format!(
                    "{host} stuck in {state:?} after {}s",
                    self.timings.state_timeout.as_secs()
                )));
            }
        }
    }
}
