// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::fmt;

/// LabelSelector is used to select the pods backing a service by matching their labels.
///
/// Only equality-based match labels are supported, which is all a
/// Service selector can express.
///
/// More detailed information: https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/#label-selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn from_match_labels(match_labels: BTreeMap<String, String>) -> LabelSelector {
        LabelSelector { match_labels }
    }

    pub fn match_labels(&self) -> &BTreeMap<String, String> {
        &self.match_labels
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    /// Renders the selector in the `key=value,key=value` form accepted by
    /// the list API. Keys come out sorted.
    pub fn to_query(&self) -> String {
        self.match_labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}
