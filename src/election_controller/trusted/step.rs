// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT

/// The steps of one election reconcile. The usize payloads are indices into
/// the workload list fetched in AfterListWorkloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionReconcileStep {
    Init,
    AfterGetRoutingRule,
    AfterListWorkloads,
    // Verifying the workload that already carries the active label
    AfterVerifyActive(usize),
    // Demotion sent; the active scan resumes at the index
    AfterDemote(usize),
    // Verifying an election candidate
    AfterVerifyCandidate(usize),
    AfterLabelActive,
    AfterPatchSelector,
    Done,
    Error,
}
