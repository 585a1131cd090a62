// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::label_selector::*;
use std::collections::BTreeMap;

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// Tests for label selector
#[test]
pub fn test_default() {
    let label_selector = LabelSelector::default();
    assert!(label_selector.is_empty());
    assert_eq!(label_selector.to_query(), "");
}

#[test]
pub fn test_matches() {
    let label_selector = LabelSelector::from_match_labels(labels(&[("app", "redis"), ("tier", "db")]));
    assert!(label_selector.matches(&labels(&[("app", "redis"), ("tier", "db"), ("extra", "x")])));
    assert!(!label_selector.matches(&labels(&[("app", "redis")])));
    assert!(!label_selector.matches(&labels(&[("app", "nginx"), ("tier", "db")])));
}

#[test]
pub fn test_to_query() {
    let label_selector = LabelSelector::from_match_labels(labels(&[("tier", "db"), ("app", "redis")]));
    assert_eq!(label_selector.to_query(), "app=redis,tier=db");
    assert_eq!(format!("{}", label_selector), "app=redis,tier=db");
}
