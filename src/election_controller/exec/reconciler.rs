// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::election_controller::trusted::{exec_types::*, step::*};
use crate::external_shim_layer::{VerifyRequest, VerifyResponse};
use crate::kubernetes_api_objects::prelude::*;
use crate::reconciler::{io::*, reconciler::*};
use tracing::{info, warn};

// ElectionReconcileState describes the local state with which the reconcile functions make decisions.
// It lives for one reconcile only: nothing is carried over between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionReconcileState {
    pub reconcile_step: ElectionReconcileStep,
    pub routing_rule: Option<RoutingRule>,
    pub workloads: Vec<Workload>,
    pub confirmed_active: Option<String>,
}

pub struct ElectionReconciler {}

impl Reconciler for ElectionReconciler {
    type K = ServiceElection;
    type S = ElectionReconcileState;
    type EReq = VerifyRequest;
    type EResp = VerifyResponse;

    fn reconcile_init_state() -> Self::S {
        reconcile_init_state()
    }

    fn reconcile_core(
        policy: &Self::K,
        resp_o: Option<Response<Self::EResp>>,
        state: Self::S,
    ) -> (Self::S, Option<Request<Self::EReq>>) {
        reconcile_core(policy, resp_o, state)
    }

    fn reconcile_done(state: &Self::S) -> bool {
        reconcile_done(state)
    }

    fn reconcile_error(state: &Self::S) -> bool {
        reconcile_error(state)
    }
}

pub fn reconcile_init_state() -> ElectionReconcileState {
    ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::Init,
        routing_rule: None,
        workloads: Vec::new(),
        confirmed_active: None,
    }
}

pub fn reconcile_done(state: &ElectionReconcileState) -> bool {
    matches!(state.reconcile_step, ElectionReconcileStep::Done)
}

pub fn reconcile_error(state: &ElectionReconcileState) -> bool {
    matches!(state.reconcile_step, ElectionReconcileStep::Error)
}

type Step = (ElectionReconcileState, Option<Request<VerifyRequest>>);

pub fn reconcile_core(
    policy: &ServiceElection,
    resp_o: Option<Response<VerifyResponse>>,
    state: ElectionReconcileState,
) -> Step {
    let service = policy.service_name.as_str();
    match state.reconcile_step {
        ElectionReconcileStep::Init => {
            if let Some(reason) = policy.invalid_reason() {
                warn!("Skip invalid election policy for service '{}': {}", service, reason);
                return (done_state(state), None);
            }
            let req = KubeAPIRequest::GetRoutingRule(KubeGetRoutingRuleRequest {
                name: service.to_string(),
            });
            let state_prime = ElectionReconcileState {
                reconcile_step: ElectionReconcileStep::AfterGetRoutingRule,
                ..state
            };
            (state_prime, Some(Request::KRequest(req)))
        }
        ElectionReconcileStep::AfterGetRoutingRule => {
            match k_response(resp_o) {
                Some(KubeAPIResponse::GetRoutingRuleResponse(Ok(rule))) => {
                    if rule.base_selector.is_empty() {
                        warn!("Service {} has no selector, skip election", service);
                        return (done_state(state), None);
                    }
                    let req = KubeAPIRequest::ListWorkloads(KubeListWorkloadsRequest {
                        label_selector: rule.base_selector.clone(),
                    });
                    let state_prime = ElectionReconcileState {
                        reconcile_step: ElectionReconcileStep::AfterListWorkloads,
                        routing_rule: Some(rule),
                        ..state
                    };
                    (state_prime, Some(Request::KRequest(req)))
                }
                Some(KubeAPIResponse::GetRoutingRuleResponse(Err(APIError::ObjectNotFound))) => {
                    info!("Service {} not found, skip election", service);
                    (done_state(state), None)
                }
                _ => (error_state(state), None),
            }
        }
        ElectionReconcileStep::AfterListWorkloads => match k_response(resp_o) {
            Some(KubeAPIResponse::ListWorkloadsResponse(Ok(workloads))) => {
                if workloads.is_empty() {
                    info!("No pods found for service {}, skip election", service);
                    return (done_state(state), None);
                }
                info!(
                    "Find pods for service {}: {}",
                    service,
                    workloads
                        .iter()
                        .map(|w| w.name.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                );
                let state_prime = ElectionReconcileState { workloads, ..state };
                scan_labeled_active(policy, state_prime, 0)
            }
            _ => (error_state(state), None),
        },
        ElectionReconcileStep::AfterVerifyActive(index) => {
            let verified = match external_response(resp_o) {
                Some(resp) => resp.verified,
                None => return (error_state(state), None),
            };
            let name = match state.workloads.get(index) {
                Some(workload) => workload.name.clone(),
                None => return (error_state(state), None),
            };
            if verified {
                info!("Confirm the running pod is truly active: {}", name);
                let state_prime = ElectionReconcileState {
                    confirmed_active: Some(name),
                    ..state
                };
                scan_labeled_active(policy, state_prime, index + 1)
            } else {
                info!("The running pod is not truly active, delabel it: {}", name);
                demote(state, index)
            }
        }
        ElectionReconcileStep::AfterDemote(next) => match k_response(resp_o) {
            Some(KubeAPIResponse::LabelWorkloadResponse(res)) => {
                if let Err(err) = res {
                    warn!("Demotion for service {} did not happen: {}", service, err);
                }
                scan_labeled_active(policy, state, next)
            }
            _ => (error_state(state), None),
        },
        ElectionReconcileStep::AfterVerifyCandidate(index) => {
            let verified = match external_response(resp_o) {
                Some(resp) => resp.verified,
                None => return (error_state(state), None),
            };
            if index >= state.workloads.len() {
                return (error_state(state), None);
            }
            if verified {
                info!("Active script passed in pod: {}", state.workloads[index].name);
                label_active(state, index)
            } else {
                verify_next_candidate(policy, state, index + 1)
            }
        }
        ElectionReconcileStep::AfterLabelActive => match k_response(resp_o) {
            // An election always re-confirms the route, even if the selector already carries the key
            Some(KubeAPIResponse::LabelWorkloadResponse(Ok(()))) => patch_selector(state),
            Some(KubeAPIResponse::LabelWorkloadResponse(Err(err))) => {
                warn!("Election for service {} did not happen: {}", service, err);
                (done_state(state), None)
            }
            _ => (error_state(state), None),
        },
        ElectionReconcileStep::AfterPatchSelector => match k_response(resp_o) {
            Some(KubeAPIResponse::PatchRoutingRuleSelectorResponse(res)) => {
                if let Err(err) = res {
                    warn!("Patching service {} did not happen: {}", service, err);
                }
                (done_state(state), None)
            }
            _ => (error_state(state), None),
        },
        ElectionReconcileStep::Done | ElectionReconcileStep::Error => (state, None),
    }
}

// Walks the workloads from `from` looking for the active label. Every invalid
// active workload is demoted, the first valid one is confirmed and any later
// one is demoted as a duplicate. Once the scan is over, either the route is
// finalized for the confirmed workload or an election starts.
fn scan_labeled_active(policy: &ServiceElection, mut state: ElectionReconcileState, from: usize) -> Step {
    for index in from..state.workloads.len() {
        let workload = &state.workloads[index];
        if !workload.is_labeled_active() {
            continue;
        }
        if state.confirmed_active.is_some() {
            warn!("Find a duplicate pod with active label, delabel it: {}", workload.name);
            return demote(state, index);
        }
        if !workload.is_running() {
            info!("Find a pod with active label but not running, delabel it: {}", workload.name);
            return demote(state, index);
        }
        info!("Find a running pod with active label: {}", workload.name);
        if policy.auto_elect {
            state.confirmed_active = Some(workload.name.clone());
            continue;
        }
        return verify(policy, state, index, ElectionReconcileStep::AfterVerifyActive(index));
    }
    if state.confirmed_active.is_some() {
        finalize_confirmed(state)
    } else {
        elect(policy, state)
    }
}

fn finalize_confirmed(state: ElectionReconcileState) -> Step {
    let pinned = state
        .routing_rule
        .as_ref()
        .map(RoutingRule::is_pinned_to_active)
        .unwrap_or(false);
    if pinned {
        (done_state(state), None)
    } else {
        patch_selector(state)
    }
}

fn elect(policy: &ServiceElection, state: ElectionReconcileState) -> Step {
    if policy.auto_elect {
        match state.workloads.iter().position(Workload::is_running) {
            Some(index) => {
                info!("Auto elect the first pod: {}", state.workloads[index].name);
                label_active(state, index)
            }
            None => {
                info!("No running pod to elect for service {}", policy.service_name);
                (done_state(state), None)
            }
        }
    } else {
        verify_next_candidate(policy, state, 0)
    }
}

// First success wins: candidates after the first verified one are never evaluated.
fn verify_next_candidate(policy: &ServiceElection, state: ElectionReconcileState, from: usize) -> Step {
    let next = state
        .workloads
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, w)| w.is_running())
        .map(|(index, _)| index);
    match next {
        Some(index) => verify(policy, state, index, ElectionReconcileStep::AfterVerifyCandidate(index)),
        None => {
            info!("No pod passed the active script for service {}", policy.service_name);
            (done_state(state), None)
        }
    }
}

fn verify(
    policy: &ServiceElection,
    state: ElectionReconcileState,
    index: usize,
    next_step: ElectionReconcileStep,
) -> Step {
    let req = VerifyRequest {
        workload: state.workloads[index].name.clone(),
        command: policy.active_script.clone(),
        expected_output: policy.active_output.clone().unwrap_or_default(),
    };
    let state_prime = ElectionReconcileState {
        reconcile_step: next_step,
        ..state
    };
    (state_prime, Some(Request::ExternalRequest(req)))
}

fn demote(state: ElectionReconcileState, index: usize) -> Step {
    let req = KubeAPIRequest::LabelWorkload(KubeLabelWorkloadRequest {
        name: state.workloads[index].name.clone(),
        status: ElectionStatus::Standby,
    });
    let state_prime = ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::AfterDemote(index + 1),
        ..state
    };
    (state_prime, Some(Request::KRequest(req)))
}

fn label_active(state: ElectionReconcileState, index: usize) -> Step {
    let req = KubeAPIRequest::LabelWorkload(KubeLabelWorkloadRequest {
        name: state.workloads[index].name.clone(),
        status: ElectionStatus::Active,
    });
    let state_prime = ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::AfterLabelActive,
        ..state
    };
    (state_prime, Some(Request::KRequest(req)))
}

fn patch_selector(state: ElectionReconcileState) -> Step {
    let name = match state.routing_rule.as_ref() {
        Some(rule) => rule.name.clone(),
        None => return (error_state(state), None),
    };
    let req = KubeAPIRequest::PatchRoutingRuleSelector(KubePatchSelectorRequest { name });
    let state_prime = ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::AfterPatchSelector,
        ..state
    };
    (state_prime, Some(Request::KRequest(req)))
}

fn k_response(resp_o: Option<Response<VerifyResponse>>) -> Option<KubeAPIResponse> {
    resp_o.and_then(Response::into_k_response)
}

fn external_response(resp_o: Option<Response<VerifyResponse>>) -> Option<VerifyResponse> {
    resp_o.and_then(Response::into_external_response)
}

pub fn done_state(state: ElectionReconcileState) -> ElectionReconcileState {
    ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::Done,
        ..state
    }
}

pub fn error_state(state: ElectionReconcileState) -> ElectionReconcileState {
    ElectionReconcileState {
        reconcile_step: ElectionReconcileStep::Error,
        ..state
    }
}
