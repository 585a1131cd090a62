// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// APIError is the form in which failures of the cluster accessor
/// are handed back to reconcile_core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum APIError {
    #[error("ObjectNotFound")]
    ObjectNotFound,
    #[error("BadRequest")]
    BadRequest,
    #[error("Conflict")]
    Conflict,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid")]
    Invalid,
    #[error("InternalError")]
    InternalError,
    #[error("Timeout")]
    Timeout,
    #[error("ServerTimeout")]
    ServerTimeout,
    #[error("ExecFailed: {0}")]
    ExecFailed(String),
    #[error("Other: {0}")]
    Other(String),
}

impl APIError {
    pub fn is_object_not_found(&self) -> bool {
        matches!(self, APIError::ObjectNotFound)
    }
}

// TODO: distinguish connection failures from other client-side errors once
// the tick loop has a backoff tier.
pub fn kube_error_to_api_error(error: &kube::Error) -> APIError {
    match error {
        kube::Error::Api(error_resp) => match error_resp.reason.as_str() {
            "NotFound" => APIError::ObjectNotFound,
            "BadRequest" => APIError::BadRequest,
            "Conflict" => APIError::Conflict,
            "Forbidden" => APIError::Forbidden,
            "Invalid" => APIError::Invalid,
            "InternalError" => APIError::InternalError,
            "Timeout" => APIError::Timeout,
            "ServerTimeout" => APIError::ServerTimeout,
            _ => APIError::Other(error_resp.message.clone()),
        },
        other => APIError::Other(other.to_string()),
    }
}
