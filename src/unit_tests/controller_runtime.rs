// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::election_controller::exec::reconciler::ElectionReconciler;
use crate::election_controller::trusted::exec_types::ServiceElection;
use crate::external_shim_layer::VerificationRunner;
use crate::kubernetes_api_objects::prelude::*;
use crate::shim_layer::controller_runtime::*;
use crate::unit_tests::fake_cluster::FakeCluster;
use crate::Error;
use std::sync::Arc;
use std::time::Duration;

fn manual(name: &str) -> ServiceElection {
    ServiceElection::verified(name, vec!["check.sh".to_string()], "ok")
}

fn runner(cluster: &Arc<FakeCluster>) -> VerificationRunner<FakeCluster> {
    VerificationRunner::new(cluster.clone(), Duration::from_secs(10))
}

fn writes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
pub async fn test_confirmed_active_gets_pinned_then_settles() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("svc1", &[("app", "svc1")])
            .with_pod("p1", "svc1", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_pod("p2", "svc1", PodPhase::Running, ElectionStatus::Active)
            .with_exec_output("p1", Ok("ok"))
            .with_exec_output("p2", Ok("ok\n")),
    );
    let policies = vec![manual("svc1")];
    let external = runner(&cluster);

    reconcile_all(&policies, cluster.as_ref(), &external).await;
    assert_eq!(cluster.take_writes(), writes(&["patch svc1 active-standby-status=active"]));
    assert_eq!(cluster.selector("svc1").get(ELECTION_STATUS_LABEL).map(String::as_str), Some("active"));

    // Nothing changed in the cluster, so the next tick writes nothing
    reconcile_all(&policies, cluster.as_ref(), &external).await;
    assert!(cluster.take_writes().is_empty());
    assert_eq!(cluster.active_pods(), writes(&["p2"]));
}

#[tokio::test]
pub async fn test_failover_to_verified_candidate() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("svc1", &[("app", "svc1")])
            .with_pod("p1", "svc1", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_pod("p2", "svc1", PodPhase::Running, ElectionStatus::Active)
            .with_exec_output("p1", Ok("ok"))
            .with_exec_output("p2", Ok("fail")),
    );
    let result = reconcile_with::<ElectionReconciler, _, _>(&manual("svc1"), cluster.as_ref(), &runner(&cluster)).await;
    assert!(result.is_ok());
    assert_eq!(
        cluster.take_writes(),
        writes(&[
            "label p2 active-standby-status=none",
            "label p1 active-standby-status=active",
            "patch svc1 active-standby-status=active",
        ])
    );
    assert_eq!(cluster.pod_label("p2").as_deref(), Some("none"));
    assert_eq!(cluster.active_pods(), writes(&["p1"]));
}

#[tokio::test]
pub async fn test_active_crash_fails_over_on_next_tick() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("nginx", &[("app", "nginx")])
            .with_pod("n1", "nginx", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_pod("n2", "nginx", PodPhase::Running, ElectionStatus::Unlabeled),
    );
    let policies = vec![ServiceElection::auto("nginx")];
    let external = runner(&cluster);

    reconcile_all(&policies, cluster.as_ref(), &external).await;
    assert_eq!(cluster.active_pods(), writes(&["n1"]));
    cluster.take_writes();

    cluster.set_phase("n1", PodPhase::Failed);
    reconcile_all(&policies, cluster.as_ref(), &external).await;
    assert_eq!(cluster.active_pods(), writes(&["n2"]));
    assert_eq!(
        cluster.take_writes(),
        writes(&[
            "label n1 active-standby-status=none",
            "label n2 active-standby-status=active",
            "patch nginx active-standby-status=active",
        ])
    );
    assert!(cluster.take_exec_calls().is_empty());
}

#[tokio::test]
pub async fn test_failing_service_does_not_block_others() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("broken", &[("app", "broken")])
            .with_unreachable_service("broken")
            .with_service("nginx", &[("app", "nginx")])
            .with_pod("n1", "nginx", PodPhase::Running, ElectionStatus::Unlabeled),
    );
    let external = runner(&cluster);
    let result = reconcile_with::<ElectionReconciler, _, _>(&ServiceElection::auto("broken"), cluster.as_ref(), &external).await;
    assert!(matches!(result, Err(Error::ReconcileCoreError)));

    let policies = vec![
        ServiceElection::auto("broken"),
        ServiceElection::auto("missing"),
        manual(""),
        ServiceElection::auto("nginx"),
    ];
    reconcile_all(&policies, cluster.as_ref(), &external).await;
    assert_eq!(
        cluster.take_writes(),
        writes(&[
            "label n1 active-standby-status=active",
            "patch nginx active-standby-status=active",
        ])
    );
}

#[tokio::test]
pub async fn test_services_are_independent() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("nginx", &[("app", "nginx")])
            .with_service("redis", &[("app", "redis")])
            .with_pod("n1", "nginx", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_pod("r1", "redis", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_pod("r2", "redis", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_exec_output("r1", Ok("0"))
            .with_exec_output("r2", Ok("1")),
    );
    let policies = vec![
        ServiceElection::auto("nginx"),
        ServiceElection::verified("redis", vec!["check.sh".to_string()], "1"),
    ];
    reconcile_all(&policies, cluster.as_ref(), &runner(&cluster)).await;
    assert_eq!(cluster.active_pods(), writes(&["n1", "r2"]));
    assert_eq!(cluster.take_exec_calls(), writes(&["r1", "r2"]));
}

#[tokio::test]
pub async fn test_failed_label_write_leaves_route_alone() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("nginx", &[("app", "nginx")])
            .with_pod("n1", "nginx", PodPhase::Running, ElectionStatus::Unlabeled)
            .with_failing_label_write("n1"),
    );
    let result = reconcile_with::<ElectionReconciler, _, _>(&ServiceElection::auto("nginx"), cluster.as_ref(), &runner(&cluster)).await;
    assert!(result.is_ok());
    assert_eq!(cluster.take_writes(), writes(&["label n1 active-standby-status=active"]));
    assert!(cluster.selector("nginx").get(ELECTION_STATUS_LABEL).is_none());
}

#[tokio::test(start_paused = true)]
pub async fn test_run_controller_stops_on_shutdown() {
    let cluster = Arc::new(
        FakeCluster::new()
            .with_service("nginx", &[("app", "nginx")])
            .with_pod("n1", "nginx", PodPhase::Running, ElectionStatus::Unlabeled),
    );
    let policies = vec![ServiceElection::auto("nginx")];
    let external = runner(&cluster);
    let shutdown = tokio::time::sleep(Duration::from_secs(12));

    run_controller(&policies, cluster.as_ref(), &external, Duration::from_secs(5), shutdown).await;

    // Ticks at 0s, 5s and 10s: the first elects, the others find nothing to do
    assert_eq!(
        cluster.take_writes(),
        writes(&[
            "label n1 active-standby-status=active",
            "patch nginx active-standby-status=active",
        ])
    );
    assert_eq!(cluster.active_pods(), writes(&["n1"]));
}
