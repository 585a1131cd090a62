// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::election_controller::exec::reconciler::ElectionReconciler;
use crate::election_controller::trusted::exec_types::ServiceElection;
use crate::external_shim_layer::{ExternalShimLayer, VerifyRequest, VerifyResponse};
use crate::kubernetes_api_objects::prelude::*;
use crate::reconciler::{io::*, reconciler::*};
use crate::shim_layer::cluster_accessor::ClusterAccessor;
use crate::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// The shim layer connects the pure reconciler to the cluster accessor and the external shim layer.
// Nothing here makes decisions: each request coming out of reconcile_core is sent as is,
// and whatever comes back (including failures) is handed to the next reconcile_core step.

// run_controller reconciles every policy once per period until `shutdown` resolves.
// A tick that is still running when the next one is due delays it; missed ticks are skipped.
pub async fn run_controller<A, E, F>(
    policies: &[ServiceElection],
    accessor: &A,
    external: &E,
    period: Duration,
    shutdown: F,
) where
    A: ClusterAccessor,
    E: ExternalShimLayer<VerifyRequest, VerifyResponse>,
    F: Future<Output = ()>,
{
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("starting controller with {} election policies", policies.len());
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                let started = Instant::now();
                reconcile_all(policies, accessor, external).await;
                let elapsed = started.elapsed();
                if elapsed > period {
                    warn!("Tick took {:?}, longer than the period {:?}; overlapping ticks are skipped", elapsed, period);
                }
            }
        }
    }
    info!("controller terminated");
}

// reconcile_all runs one tick: every policy is reconciled in order, and a
// failing service never stops the ones after it.
pub async fn reconcile_all<A, E>(policies: &[ServiceElection], accessor: &A, external: &E)
where
    A: ClusterAccessor,
    E: ExternalShimLayer<VerifyRequest, VerifyResponse>,
{
    // Invalid policies were reported when the config was loaded
    for policy in policies.iter().filter(|policy| policy.is_valid()) {
        info!("Get service election: {}", policy);
        if let Err(err) = reconcile_with::<ElectionReconciler, A, E>(policy, accessor, external).await {
            error!("Reconciling {} failed: {}, will retry next tick", policy.service_name, err);
        }
    }
}

// reconcile_with drives ReconcilerType::reconcile_core for one object until it is done or errors.
// It starts from ReconcilerType::reconcile_init_state, and for each request returned by
// reconcile_core it calls the cluster accessor (or the external shim layer) and feeds the
// response into the next reconcile_core call.
pub async fn reconcile_with<ReconcilerType, A, E>(
    k: &ServiceElection,
    accessor: &A,
    external: &E,
) -> Result<(), Error>
where
    ReconcilerType: Reconciler<K = ServiceElection>,
    A: ClusterAccessor,
    E: ExternalShimLayer<ReconcilerType::EReq, ReconcilerType::EResp>,
{
    let log_header = format!("Reconciling {}:", k.service_name);
    let mut state = ReconcilerType::reconcile_init_state();
    let mut resp_option: Option<Response<ReconcilerType::EResp>> = None;

    loop {
        if ReconcilerType::reconcile_done(&state) {
            debug!("{} done", log_header);
            return Ok(());
        }
        if ReconcilerType::reconcile_error(&state) {
            warn!("{} error", log_header);
            return Err(Error::ReconcileCoreError);
        }
        let (state_prime, request_option) = ReconcilerType::reconcile_core(k, resp_option, state);
        resp_option = match request_option {
            Some(Request::KRequest(req)) => {
                Some(Response::KResponse(send_kube_request(accessor, req, &log_header).await))
            }
            Some(Request::ExternalRequest(req)) => Some(Response::ExternalResponse(external.external_call(req).await)),
            None => None,
        };
        state = state_prime;
    }
}

async fn send_kube_request<A: ClusterAccessor>(accessor: &A, req: KubeAPIRequest, log_header: &str) -> KubeAPIResponse {
    let key = req.to_string();
    match &req {
        KubeAPIRequest::GetRoutingRule(get_req) => {
            let res = accessor.get_routing_rule(&get_req.name).await;
            log_result(log_header, &key, &res);
            KubeAPIResponse::GetRoutingRuleResponse(res)
        }
        KubeAPIRequest::ListWorkloads(list_req) => {
            let res = accessor.list_workloads(&list_req.label_selector).await;
            log_result(log_header, &key, &res);
            KubeAPIResponse::ListWorkloadsResponse(res)
        }
        KubeAPIRequest::LabelWorkload(label_req) => {
            let res = accessor
                .label_workload(&label_req.name, ELECTION_STATUS_LABEL, label_req.status.label_value())
                .await;
            log_result(log_header, &key, &res);
            KubeAPIResponse::LabelWorkloadResponse(res)
        }
        KubeAPIRequest::PatchRoutingRuleSelector(patch_req) => {
            let res = accessor
                .patch_routing_rule_selector(&patch_req.name, ELECTION_STATUS_LABEL, ELECTION_STATUS_ACTIVE)
                .await;
            log_result(log_header, &key, &res);
            KubeAPIResponse::PatchRoutingRuleSelectorResponse(res)
        }
    }
}

fn log_result<T>(log_header: &str, key: &str, res: &Result<T, APIError>) {
    match res {
        Ok(_) => info!("{} {} done", log_header, key),
        Err(err) if err.is_object_not_found() => info!("{} {} not found", log_header, key),
        Err(err) => error!("{} {} failed with error: {}", log_header, key, err),
    }
}
