// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod config;
pub mod election_controller;
#[path = "external_shim_layer/mod.rs"]
pub mod external_shim_layer;
pub mod kubernetes_api_objects;
#[path = "reconciler/mod.rs"]
pub mod reconciler;
#[path = "shim_layer/mod.rs"]
pub mod shim_layer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read config: {0}")]
    ConfigReadFailed(#[source] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ConfigParseFailed(#[source] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
    #[error("MissingNamespace: environment variable {0} is not set")]
    MissingNamespace(&'static str),
    #[error("Failed to get kube client: {0}")]
    ClientGetFailed(#[from] kube::Error),
    #[error("Failed to bind health endpoint: {0}")]
    HealthServerBindFailed(#[source] warp::Error),
    #[error("ReconcileCoreError")]
    ReconcileCoreError,
}
