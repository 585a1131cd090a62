// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::error::*;
use kube::error::ErrorResponse;

fn api_error(reason: &str, code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} happened", reason),
        reason: reason.to_string(),
        code,
    })
}

// Tests for error
#[test]
pub fn test_apierror_fmt() {
    assert_eq!(format!("{}", APIError::ObjectNotFound), "ObjectNotFound");
    assert_eq!(format!("{}", APIError::Conflict), "Conflict");
    assert_eq!(
        format!("{}", APIError::ExecFailed("command terminated with exit code 1".to_string())),
        "ExecFailed: command terminated with exit code 1"
    );
}

#[test]
pub fn test_kube_error_to_api_error() {
    assert_eq!(kube_error_to_api_error(&api_error("NotFound", 404)), APIError::ObjectNotFound);
    assert_eq!(kube_error_to_api_error(&api_error("Conflict", 409)), APIError::Conflict);
    assert_eq!(kube_error_to_api_error(&api_error("Forbidden", 403)), APIError::Forbidden);
    assert_eq!(kube_error_to_api_error(&api_error("Invalid", 422)), APIError::Invalid);
    assert_eq!(
        kube_error_to_api_error(&api_error("ServerTimeout", 504)),
        APIError::ServerTimeout
    );
    assert_eq!(
        kube_error_to_api_error(&api_error("TooManyRequests", 429)),
        APIError::Other("TooManyRequests happened".to_string())
    );
}

#[test]
pub fn test_is_object_not_found() {
    assert!(APIError::ObjectNotFound.is_object_not_found());
    assert!(!APIError::InternalError.is_object_not_found());
}
