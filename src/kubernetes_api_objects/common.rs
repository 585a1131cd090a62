// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use std::fmt;

/// The controller-managed label that records the election outcome on a pod.
/// The same key is added to the service selector to pin traffic to the active pod.
pub const ELECTION_STATUS_LABEL: &str = "active-standby-status";

pub const ELECTION_STATUS_ACTIVE: &str = "active";

pub const ELECTION_STATUS_NONE: &str = "none";

/// ElectionStatus is the decoded value of the reserved label.
///
/// Any value other than `active` or `none` is treated as Unlabeled,
/// so a hand-edited label never counts as an elected workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionStatus {
    Active,
    Standby,
    Unlabeled,
}

impl ElectionStatus {
    pub fn from_label_value(value: Option<&str>) -> ElectionStatus {
        match value {
            Some(ELECTION_STATUS_ACTIVE) => ElectionStatus::Active,
            Some(ELECTION_STATUS_NONE) => ElectionStatus::Standby,
            _ => ElectionStatus::Unlabeled,
        }
    }

    /// The label value written to the cluster. Unlabeled is never written,
    /// demotion always writes `none`.
    pub fn label_value(&self) -> &'static str {
        match self {
            ElectionStatus::Active => ELECTION_STATUS_ACTIVE,
            ElectionStatus::Standby | ElectionStatus::Unlabeled => ELECTION_STATUS_NONE,
        }
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", ELECTION_STATUS_LABEL, self.label_value())
    }
}
