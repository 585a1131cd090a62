// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::common::*;
use crate::kubernetes_api_objects::label_selector::LabelSelector;
use k8s_openapi::api::core::v1::Service;
use std::collections::BTreeMap;

/// RoutingRule is the traffic-selection rule of a service, decoded from a Service.
///
/// The selector is split in two: the base selector (every key except the
/// reserved one) identifies the candidate pods, and `pinned_status` records
/// the reserved key, whose presence means traffic is already pinned to the active pod.
///
/// More detailed information: https://kubernetes.io/docs/concepts/services-networking/service/.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    pub name: String,
    pub base_selector: LabelSelector,
    pub pinned_status: Option<String>,
}

impl RoutingRule {
    pub fn new(name: impl Into<String>, selector: BTreeMap<String, String>) -> RoutingRule {
        let mut base = selector;
        let pinned_status = base.remove(ELECTION_STATUS_LABEL);
        RoutingRule {
            name: name.into(),
            base_selector: LabelSelector::from_match_labels(base),
            pinned_status,
        }
    }

    pub fn from_kube(service: Service) -> Option<RoutingRule> {
        let name = service.metadata.name?;
        let selector = service
            .spec
            .and_then(|spec| spec.selector)
            .unwrap_or_default();
        Some(RoutingRule::new(name, selector))
    }

    /// True only if the reserved key is present and already points at `active`.
    pub fn is_pinned_to_active(&self) -> bool {
        self.pinned_status.as_deref() == Some(ELECTION_STATUS_ACTIVE)
    }
}
