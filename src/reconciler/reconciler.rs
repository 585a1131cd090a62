// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::reconciler::io::*;

/// Reconciler is the pure decision core of a controller.
///
/// reconcile_core never performs I/O. Each call consumes the response to the
/// previous request (if any) and returns the next local state together with
/// the next request for the shim layer to send. The shim layer keeps calling
/// it until reconcile_done or reconcile_error holds.
pub trait Reconciler {
    // The object that drives one reconcile
    type K;
    // The local state
    type S;
    // The external request and response types
    type EReq;
    type EResp;

    fn reconcile_init_state() -> Self::S;

    fn reconcile_core(
        k: &Self::K,
        resp_o: Option<Response<Self::EResp>>,
        state: Self::S,
    ) -> (Self::S, Option<Request<Self::EReq>>);

    fn reconcile_done(state: &Self::S) -> bool;

    fn reconcile_error(state: &Self::S) -> bool;
}
