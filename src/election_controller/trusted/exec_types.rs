// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use std::fmt;

/// ServiceElection is the election policy of one service, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceElection {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub auto_elect: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_script: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_output: Option<String>,
}

impl ServiceElection {
    pub fn auto(service_name: impl Into<String>) -> ServiceElection {
        ServiceElection {
            service_name: service_name.into(),
            auto_elect: true,
            ..ServiceElection::default()
        }
    }

    pub fn verified(
        service_name: impl Into<String>,
        active_script: Vec<String>,
        active_output: impl Into<String>,
    ) -> ServiceElection {
        ServiceElection {
            service_name: service_name.into(),
            auto_elect: false,
            active_script,
            active_output: Some(active_output.into()),
        }
    }

    /// Returns why the policy cannot be acted upon, or None if it can.
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if self.service_name.is_empty() {
            Some("serviceName is empty")
        } else if !self.auto_elect && self.active_script.is_empty() {
            Some("activeScript is required when autoElect is false")
        } else if !self.auto_elect && self.active_output.is_none() {
            Some("activeOutput is required when autoElect is false")
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_reason().is_none()
    }
}

impl fmt::Display for ServiceElection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceElection{{serviceName='{}', autoElect={}, activeScript={:?}, activeOutput={:?}}}",
            self.service_name, self.auto_elect, self.active_script, self.active_output
        )
    }
}
