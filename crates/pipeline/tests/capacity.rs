mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;
use blusanta_cloud::compute::InstanceState;
use blusanta_pipeline::{CapacityManager, CapacityTimings, HostRef, PipelineError};
use common::FakeCompute;

fn host(name: &str) -> HostRef {
    HostRef {
        zone: "us-central1-a".into(),
        name: name.into(),
    }
}

#[tokio::test(start_paused = true)]
async fn running_hosts_are_used_as_is() {
    let compute = Arc::new(FakeCompute::default().with_host(
        "a",
        InstanceState::Running,
        Some("10.0.0.1"),
    ));
    let manager = CapacityManager::new(compute.clone(), vec![host("a")], CapacityTimings::default());

    assert_eq!(manager.ensure_running().await.unwrap(), vec!["10.0.0.1"]);
    assert_eq!(compute.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn stopped_hosts_are_started() {
    let compute = Arc::new(FakeCompute::default().with_host(
        "a",
        InstanceState::Terminated,
        Some("10.0.0.1"),
    ));
    let manager = CapacityManager::new(compute.clone(), vec![host("a")], CapacityTimings::default());

    assert_eq!(manager.ensure_running().await.unwrap(), vec!["10.0.0.1"]);
    assert_eq!(compute.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn hosts_without_address_are_skipped() {
    let compute = Arc::new(
        FakeCompute::default()
            .with_host("a", InstanceState::Running, None)
            .with_host("b", InstanceState::Running, Some("10.0.0.2")),
    );
    let manager = CapacityManager::new(
        compute,
        vec![host("a"), host("b")],
        CapacityTimings::default(),
    );

    assert_eq!(manager.ensure_running().await.unwrap(), vec!["10.0.0.2"]);
}

#[tokio::test(start_paused = true)]
async fn no_usable_host_is_a_capacity_error() {
    let compute = Arc::new(FakeCompute::default().with_host("a", InstanceState::Running, None));
    let manager = CapacityManager::new(compute, vec![host("a")], CapacityTimings::default());

    assert_matches!(
        manager.ensure_running().await,
        Err(PipelineError::Capacity(_))
    );
}

#[tokio::test(start_paused = true)]
async fn host_stuck_in_transition_times_out() {
    let compute = Arc::new(FakeCompute::default().with_host(
        "a",
        InstanceState::Stopping,
        Some("10.0.0.1"),
    ));
    let manager = CapacityManager::new(compute, vec![host("a")], CapacityTimings::default());

    let err = manager.ensure_running().await.unwrap_err();
    assert_matches!(&err, PipelineError::Capacity(msg) if msg.contains("Stopping"));
}
