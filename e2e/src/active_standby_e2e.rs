// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{
    api::{Api, DeleteParams, ListParams},
    discovery::Discovery,
    Client,
};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::*;

use crate::common::*;

// Must match the label the controller manages and the service in its config.
const STATUS_LABEL: &str = "active-standby-status";
const SERVICE_NAME: &str = "nginx";

pub fn nginx_deployment() -> String {
    "
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: nginx
    spec:
      replicas: 3
      selector:
        matchLabels:
          app: nginx
      template:
        metadata:
          labels:
            app: nginx
        spec:
          containers:
          - name: nginx
            image: nginx:1.25
    "
    .to_string()
}

pub fn nginx_service() -> String {
    "
    apiVersion: v1
    kind: Service
    metadata:
      name: nginx
    spec:
      selector:
        app: nginx
      ports:
      - port: 80
    "
    .to_string()
}

// Returns the names of live pods carrying the active label.
async fn active_pods(pod_api: &Api<Pod>) -> Result<Vec<String>, Error> {
    let pods = pod_api
        .list(&ListParams::default().labels(&format!("app=nginx,{}=active", STATUS_LABEL)))
        .await?;
    Ok(pods
        .items
        .into_iter()
        .filter(|pod| pod.metadata.deletion_timestamp.is_none())
        .filter_map(|pod| pod.metadata.name)
        .collect())
}

async fn selector_pinned(svc_api: &Api<Service>) -> Result<bool, Error> {
    let svc = svc_api.get(SERVICE_NAME).await?;
    Ok(svc
        .spec
        .and_then(|spec| spec.selector)
        .and_then(|selector| selector.get(STATUS_LABEL).cloned())
        .as_deref()
        == Some("active"))
}

// Waits until exactly one pod is active and the service routes to it,
// and returns that pod. `exclude` is a pod that must not be the winner.
async fn wait_for_single_active(client: Client, exclude: Option<&str>, timeout: Duration) -> Result<String, Error> {
    let pod_api: Api<Pod> = Api::default_namespaced(client.clone());
    let svc_api: Api<Service> = Api::default_namespaced(client);
    let start = Instant::now();
    loop {
        sleep(Duration::from_secs(5)).await;
        if start.elapsed() > timeout {
            error!("Time out waiting for a single active pod");
            return Err(Error::Timeout);
        }
        let active = match active_pods(&pod_api).await {
            Ok(active) => active,
            Err(e) => {
                info!("List pods failed with error {}.", e);
                continue;
            }
        };
        match active.as_slice() {
            [] => {
                info!("No active pod yet.");
                continue;
            }
            [name] if Some(name.as_str()) == exclude => {
                info!("{} is still active.", name);
                continue;
            }
            [name] => {
                if !selector_pinned(&svc_api).await? {
                    info!("Service selector is not pinned yet.");
                    continue;
                }
                info!("{} is the only active pod.", name);
                return Ok(name.clone());
            }
            _ => {
                info!("Active pods: {}; waiting for the controller to demote.", active.join(","));
                continue;
            }
        }
    }
}

pub async fn desired_state_test(client: Client) -> Result<String, Error> {
    let active = wait_for_single_active(client, None, Duration::from_secs(300)).await?;
    info!("Desired state test passed.");
    Ok(active)
}

pub async fn failover_test(client: Client, active: String) -> Result<(), Error> {
    let pod_api: Api<Pod> = Api::default_namespaced(client.clone());
    pod_api.delete(&active, &DeleteParams::default()).await?;
    info!("Deleted the active pod {}.", active);

    let successor = wait_for_single_active(client, Some(&active), Duration::from_secs(300)).await?;
    info!("Failover test passed: {} took over from {}.", successor, active);
    Ok(())
}

// Marks a second pod active by hand; the controller has to bring it back to one.
pub async fn relabel_test(client: Client, active: String) -> Result<(), Error> {
    let pod_api: Api<Pod> = Api::default_namespaced(client.clone());
    let pods = pod_api.list(&ListParams::default().labels("app=nginx")).await?;
    let other = pods
        .items
        .into_iter()
        .filter_map(|pod| pod.metadata.name)
        .find(|name| *name != active);
    let other = match other {
        Some(other) => other,
        None => {
            error!("No standby pod to relabel");
            return Err(Error::NoStandby);
        }
    };
    let label = format!("{}=active", STATUS_LABEL);
    run_command("kubectl", vec!["label", "pod", other.as_str(), label.as_str(), "--overwrite"])?;

    // Either one may survive, depending on the order the pods are listed in
    let survivor = wait_for_single_active(client, None, Duration::from_secs(120)).await?;
    info!("Relabel test passed: {} kept the active label.", survivor);
    Ok(())
}

async fn setup(client: Client) -> Result<(), Error> {
    let discovery = Discovery::new(client.clone()).run().await?;
    apply(nginx_deployment(), client.clone(), &discovery).await?;
    apply(nginx_service(), client, &discovery).await?;
    Ok(())
}

pub async fn active_standby_e2e_test() -> Result<(), Error> {
    let client = Client::try_default().await?;
    setup(client.clone()).await?;

    let active = desired_state_test(client.clone()).await?;
    relabel_test(client.clone(), active).await?;

    info!("E2e test passed.");
    Ok(())
}

pub async fn failover_e2e_test() -> Result<(), Error> {
    let client = Client::try_default().await?;
    setup(client.clone()).await?;

    let active = desired_state_test(client.clone()).await?;
    failover_test(client.clone(), active).await?;

    info!("E2e test passed.");
    Ok(())
}
