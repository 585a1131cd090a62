// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::common::*;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;

/// PodPhase is the coarse lifecycle state reported in `.status.phase`.
///
/// More detailed information: https://kubernetes.io/docs/concepts/workloads/pods/pod-lifecycle/#pod-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn from_kube(phase: Option<&str>) -> PodPhase {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

/// Workload is one replica backing a service, decoded from a Pod.
///
/// It is re-fetched on every tick; the only state that survives between
/// ticks is the reserved label on the Pod itself, surfaced here as `election_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub phase: PodPhase,
    pub election_status: ElectionStatus,
}

impl Workload {
    pub fn new(name: impl Into<String>, phase: PodPhase, election_status: ElectionStatus) -> Workload {
        let mut labels = BTreeMap::new();
        if election_status != ElectionStatus::Unlabeled {
            labels.insert(
                ELECTION_STATUS_LABEL.to_string(),
                election_status.label_value().to_string(),
            );
        }
        Workload {
            name: name.into(),
            labels,
            phase,
            election_status,
        }
    }

    /// Returns None when the pod has no name, which the API server never
    /// returns for a persisted object.
    pub fn from_kube(pod: Pod) -> Option<Workload> {
        let name = pod.metadata.name?;
        let labels = pod.metadata.labels.unwrap_or_default();
        let phase = PodPhase::from_kube(pod.status.as_ref().and_then(|s| s.phase.as_deref()));
        let election_status =
            ElectionStatus::from_label_value(labels.get(ELECTION_STATUS_LABEL).map(String::as_str));
        Some(Workload {
            name,
            labels,
            phase,
            election_status,
        })
    }

    pub fn is_running(&self) -> bool {
        self.phase == PodPhase::Running
    }

    pub fn is_labeled_active(&self) -> bool {
        self.election_status == ElectionStatus::Active
    }
}
