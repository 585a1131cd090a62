// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::shim_layer::cluster_accessor::ClusterAccessor;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// A trait for the external api of a reconciler. Whatever reconcile_core
// cannot decide from cluster objects alone goes through here, and the
// result comes back as Response::ExternalResponse.
#[async_trait]
pub trait ExternalShimLayer<EReq, EResp>: Send + Sync {
    async fn external_call(&self, req: EReq) -> EResp;
}

/// Asks whether a workload is truly fit to be active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub workload: String,
    pub command: Vec<String>,
    pub expected_output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// VerificationRunner runs the verification command inside a workload and
/// compares the trimmed output with the expected output.
///
/// It never fails: an exec error or a timeout is reported as "not verified".
pub struct VerificationRunner<A> {
    accessor: Arc<A>,
    timeout: Duration,
}

impl<A: ClusterAccessor> VerificationRunner<A> {
    pub fn new(accessor: Arc<A>, timeout: Duration) -> VerificationRunner<A> {
        VerificationRunner { accessor, timeout }
    }

    pub async fn verify(&self, workload: &str, command: &[String], expected_output: &str) -> bool {
        info!("Executing command: {:?} in pod {}", command, workload);
        let exec = self.accessor.exec_in_workload(workload, command, true, true);
        let output = match tokio::time::timeout(self.timeout, exec).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                error!("Executing command failed: {:?} in pod {}: {}", command, workload, err);
                return false;
            }
            Err(_) => {
                error!(
                    "Executing command timed out after {:?}: {:?} in pod {}",
                    self.timeout, command, workload
                );
                return false;
            }
        };
        let trimmed = output.trim();
        let verified = trimmed == expected_output;
        info!("Comparing {} with {}: {}", trimmed, expected_output, verified);
        verified
    }
}

#[async_trait]
impl<A: ClusterAccessor> ExternalShimLayer<VerifyRequest, VerifyResponse> for VerificationRunner<A> {
    async fn external_call(&self, req: VerifyRequest) -> VerifyResponse {
        VerifyResponse {
            verified: self
                .verify(&req.workload, &req.command, &req.expected_output)
                .await,
        }
    }
}
