// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::prelude::*;
use crate::shim_layer::cluster_accessor::ClusterAccessor;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

// An in-memory namespace that keeps pods in creation order, so list results
// come back in a stable enumeration order like the API server's.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeClusterState>,
}

#[derive(Default)]
struct FakeClusterState {
    services: BTreeMap<String, BTreeMap<String, String>>,
    pods: Vec<FakePod>,
    exec_outputs: BTreeMap<String, Result<String, APIError>>,
    exec_delay: Option<Duration>,
    unreachable_services: BTreeSet<String>,
    failing_label_writes: BTreeSet<String>,
    writes: Vec<String>,
    exec_calls: Vec<String>,
}

struct FakePod {
    name: String,
    labels: BTreeMap<String, String>,
    phase: PodPhase,
}

impl FakeCluster {
    pub fn new() -> FakeCluster {
        FakeCluster::default()
    }

    pub fn with_service(self, name: &str, selector: &[(&str, &str)]) -> FakeCluster {
        self.state.lock().unwrap().services.insert(
            name.to_string(),
            selector
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_pod(self, name: &str, app: &str, phase: PodPhase, status: ElectionStatus) -> FakeCluster {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), app.to_string());
        if status != ElectionStatus::Unlabeled {
            labels.insert(ELECTION_STATUS_LABEL.to_string(), status.label_value().to_string());
        }
        self.state.lock().unwrap().pods.push(FakePod {
            name: name.to_string(),
            labels,
            phase,
        });
        self
    }

    pub fn with_exec_output(self, pod: &str, output: Result<&str, APIError>) -> FakeCluster {
        self.state
            .lock()
            .unwrap()
            .exec_outputs
            .insert(pod.to_string(), output.map(str::to_string));
        self
    }

    pub fn with_exec_delay(self, delay: Duration) -> FakeCluster {
        self.state.lock().unwrap().exec_delay = Some(delay);
        self
    }

    pub fn with_unreachable_service(self, name: &str) -> FakeCluster {
        self.state
            .lock()
            .unwrap()
            .unreachable_services
            .insert(name.to_string());
        self
    }

    pub fn with_failing_label_write(self, pod: &str) -> FakeCluster {
        self.state
            .lock()
            .unwrap()
            .failing_label_writes
            .insert(pod.to_string());
        self
    }

    pub fn set_phase(&self, pod: &str, phase: PodPhase) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.pods.iter_mut().find(|p| p.name == pod) {
            p.phase = phase;
        }
    }

    pub fn set_exec_output(&self, pod: &str, output: Result<&str, APIError>) {
        self.state
            .lock()
            .unwrap()
            .exec_outputs
            .insert(pod.to_string(), output.map(str::to_string));
    }

    // Every write attempt, successful or not, in the order it was made
    pub fn take_writes(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().writes)
    }

    pub fn take_exec_calls(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().exec_calls)
    }

    pub fn active_pods(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pods
            .iter()
            .filter(|p| p.labels.get(ELECTION_STATUS_LABEL).map(String::as_str) == Some(ELECTION_STATUS_ACTIVE))
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn pod_label(&self, pod: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pods
            .iter()
            .find(|p| p.name == pod)
            .and_then(|p| p.labels.get(ELECTION_STATUS_LABEL).cloned())
    }

    pub fn selector(&self, service: &str) -> BTreeMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(service)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClusterAccessor for FakeCluster {
    async fn get_routing_rule(&self, name: &str) -> Result<RoutingRule, APIError> {
        let state = self.state.lock().unwrap();
        if state.unreachable_services.contains(name) {
            return Err(APIError::InternalError);
        }
        state
            .services
            .get(name)
            .map(|selector| RoutingRule::new(name, selector.clone()))
            .ok_or(APIError::ObjectNotFound)
    }

    async fn list_workloads(&self, label_selector: &LabelSelector) -> Result<Vec<Workload>, APIError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|p| label_selector.matches(&p.labels))
            .map(|p| Workload {
                name: p.name.clone(),
                labels: p.labels.clone(),
                phase: p.phase,
                election_status: ElectionStatus::from_label_value(
                    p.labels.get(ELECTION_STATUS_LABEL).map(String::as_str),
                ),
            })
            .collect())
    }

    async fn label_workload(&self, name: &str, key: &str, value: &str) -> Result<(), APIError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("label {} {}={}", name, key, value));
        if state.failing_label_writes.contains(name) {
            return Err(APIError::Conflict);
        }
        match state.pods.iter_mut().find(|p| p.name == name) {
            Some(pod) => {
                pod.labels.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(APIError::ObjectNotFound),
        }
    }

    async fn patch_routing_rule_selector(&self, name: &str, key: &str, value: &str) -> Result<(), APIError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("patch {} {}={}", name, key, value));
        match state.services.get_mut(name) {
            Some(selector) => {
                selector.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(APIError::ObjectNotFound),
        }
    }

    async fn exec_in_workload(
        &self,
        name: &str,
        _command: &[String],
        _capture_stdout: bool,
        _capture_stderr: bool,
    ) -> Result<String, APIError> {
        let (delay, output) = {
            let mut state = self.state.lock().unwrap();
            state.exec_calls.push(name.to_string());
            let output = state
                .exec_outputs
                .get(name)
                .cloned()
                .unwrap_or_else(|| Err(APIError::ExecFailed("no such command".to_string())));
            (state.exec_delay, output)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        output
    }
}
