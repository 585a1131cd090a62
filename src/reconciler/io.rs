// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::prelude::*;
use std::fmt;

/// Request is what reconcile_core hands to the shim layer at each step:
/// either a call to the Kubernetes API or a call to the external shim layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<T> {
    KRequest(KubeAPIRequest),
    ExternalRequest(T),
}

/// Response is what the shim layer feeds back into the next reconcile_core step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<T> {
    KResponse(KubeAPIResponse),
    ExternalResponse(T),
}

impl<T> Response<T> {
    pub fn into_k_response(self) -> Option<KubeAPIResponse> {
        match self {
            Response::KResponse(resp) => Some(resp),
            _ => None,
        }
    }

    pub fn into_external_response(self) -> Option<T> {
        match self {
            Response::ExternalResponse(resp) => Some(resp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeAPIRequest {
    GetRoutingRule(KubeGetRoutingRuleRequest),
    ListWorkloads(KubeListWorkloadsRequest),
    LabelWorkload(KubeLabelWorkloadRequest),
    PatchRoutingRuleSelector(KubePatchSelectorRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeGetRoutingRuleRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeListWorkloadsRequest {
    pub label_selector: LabelSelector,
}

/// Sets the reserved label of one pod. Demotion is a LabelWorkload with Standby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeLabelWorkloadRequest {
    pub name: String,
    pub status: ElectionStatus,
}

/// Adds the reserved key with value `active` to the service selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubePatchSelectorRequest {
    pub name: String,
}

impl fmt::Display for KubeAPIRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KubeAPIRequest::GetRoutingRule(req) => write!(f, "Get Service {}", req.name),
            KubeAPIRequest::ListWorkloads(req) => write!(f, "List Pods with {}", req.label_selector),
            KubeAPIRequest::LabelWorkload(req) => write!(f, "Label Pod {} with {}", req.name, req.status),
            KubeAPIRequest::PatchRoutingRuleSelector(req) => write!(
                f,
                "Patch Service {} selector with {}",
                req.name,
                ElectionStatus::Active
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeAPIResponse {
    GetRoutingRuleResponse(Result<RoutingRule, APIError>),
    ListWorkloadsResponse(Result<Vec<Workload>, APIError>),
    LabelWorkloadResponse(Result<(), APIError>),
    PatchRoutingRuleSelectorResponse(Result<(), APIError>),
}
