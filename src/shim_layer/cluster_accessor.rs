// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::prelude::*;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{
    api::{Api, AttachParams, ListParams, Patch, PatchParams},
    Client,
};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// ClusterAccessor is every capability the controller needs from the cluster.
///
/// All calls are scoped to the single namespace the controller runs in.
/// Implementations report failures as APIError so that reconcile_core can
/// tell a missing object from any other failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterAccessor: Send + Sync {
    async fn get_routing_rule(&self, name: &str) -> Result<RoutingRule, APIError>;

    async fn list_workloads(&self, label_selector: &LabelSelector) -> Result<Vec<Workload>, APIError>;

    async fn label_workload(&self, name: &str, key: &str, value: &str) -> Result<(), APIError>;

    /// Merge-patches one key into the selector. Existing keys are left untouched.
    async fn patch_routing_rule_selector(&self, name: &str, key: &str, value: &str) -> Result<(), APIError>;

    /// Runs the command inside the pod and returns stdout followed by stderr.
    async fn exec_in_workload(
        &self,
        name: &str,
        command: &[String],
        capture_stdout: bool,
        capture_stderr: bool,
    ) -> Result<String, APIError>;
}

/// KubeClusterAccessor binds ClusterAccessor to the Kubernetes API through kube-rs.
pub struct KubeClusterAccessor {
    client: Client,
    namespace: String,
    exec_output_limit: usize,
}

impl KubeClusterAccessor {
    pub fn new(client: Client, namespace: impl Into<String>, exec_output_limit: usize) -> KubeClusterAccessor {
        KubeClusterAccessor {
            client,
            namespace: namespace.into(),
            exec_output_limit,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn service_api(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pod_api(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait]
impl ClusterAccessor for KubeClusterAccessor {
    async fn get_routing_rule(&self, name: &str) -> Result<RoutingRule, APIError> {
        let service = self
            .service_api()
            .get(name)
            .await
            .map_err(|err| kube_error_to_api_error(&err))?;
        RoutingRule::from_kube(service).ok_or(APIError::Invalid)
    }

    async fn list_workloads(&self, label_selector: &LabelSelector) -> Result<Vec<Workload>, APIError> {
        let lp = ListParams::default().labels(&label_selector.to_query());
        let pods = self
            .pod_api()
            .list(&lp)
            .await
            .map_err(|err| kube_error_to_api_error(&err))?;
        let mut workloads = Vec::with_capacity(pods.items.len());
        for pod in pods.items {
            match Workload::from_kube(pod) {
                Some(workload) => workloads.push(workload),
                None => warn!("Skip a pod without .metadata.name in namespace {}", self.namespace),
            }
        }
        Ok(workloads)
    }

    async fn label_workload(&self, name: &str, key: &str, value: &str) -> Result<(), APIError> {
        let patch = json!({ "metadata": { "labels": { key: value } } });
        self.pod_api()
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|err| kube_error_to_api_error(&err))?;
        Ok(())
    }

    async fn patch_routing_rule_selector(&self, name: &str, key: &str, value: &str) -> Result<(), APIError> {
        let patch = json!({ "spec": { "selector": { key: value } } });
        self.service_api()
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|err| kube_error_to_api_error(&err))?;
        Ok(())
    }

    async fn exec_in_workload(
        &self,
        name: &str,
        command: &[String],
        capture_stdout: bool,
        capture_stderr: bool,
    ) -> Result<String, APIError> {
        let ap = AttachParams::default()
            .stdin(false)
            .stdout(capture_stdout)
            .stderr(capture_stderr);
        let mut attached = self
            .pod_api()
            .exec(name, command.to_vec(), &ap)
            .await
            .map_err(|err| kube_error_to_api_error(&err))?;
        let status = attached.take_status();
        let limit = self.exec_output_limit;
        let (out, err) = tokio::join!(
            read_bounded(attached.stdout(), limit),
            read_bounded(attached.stderr(), limit)
        );
        let mut output = out.map_err(|e| APIError::ExecFailed(e.to_string()))?;
        output.extend(err.map_err(|e| APIError::ExecFailed(e.to_string()))?);

        if let Some(status) = status {
            if let Some(status) = status.await {
                if status.status.as_deref() == Some("Failure") {
                    return Err(APIError::ExecFailed(status.message.unwrap_or_default()));
                }
            }
        }
        attached
            .join()
            .await
            .map_err(|e| APIError::ExecFailed(e.to_string()))?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

// Reads at most `limit` bytes; anything past the limit is dropped.
async fn read_bounded<R>(reader: Option<R>, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit as u64).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
