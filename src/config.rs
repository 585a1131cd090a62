// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::election_controller::trusted::exec_types::ServiceElection;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// The environment variable holding the namespace the controller is confined to.
pub const NAMESPACE_ENV: &str = "POD_NAMESPACE";

/// The environment variable used for the config path when none is given on the command line.
pub const CONFIG_PATH_ENV: &str = "CONTROLLER_CONFIG";

/// ControllerConfig is the whole configuration file.
///
/// The `k8s.services` layout matches the property tree the controller has
/// always been deployed with, so existing config maps keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    #[serde(default)]
    pub k8s: ElectionConfig,
    #[serde(default)]
    pub controller: RuntimeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfig {
    #[serde(default)]
    pub services: Vec<ServiceElection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub reconcile_interval_secs: u64,
    pub exec_timeout_secs: u64,
    pub exec_output_limit: usize,
    pub health_port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            reconcile_interval_secs: 5,
            exec_timeout_secs: 10,
            exec_output_limit: 64 * 1024,
            health_port: 8080,
        }
    }
}

impl RuntimeConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}

impl ControllerConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path).map_err(Error::ConfigReadFailed)?;
        Self::from_reader(file)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut contents = String::new();
        reader
            .read_to_string(&mut contents)
            .map_err(Error::ConfigReadFailed)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, Error> {
        let config: ControllerConfig = serde_yaml::from_str(contents).map_err(Error::ConfigParseFailed)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.controller.reconcile_interval_secs == 0 {
            return Err(Error::ConfigInvalid("controller.reconcileIntervalSecs must be positive".to_string()));
        }
        if self.controller.exec_timeout_secs == 0 {
            return Err(Error::ConfigInvalid("controller.execTimeoutSecs must be positive".to_string()));
        }
        if self.controller.exec_output_limit == 0 {
            return Err(Error::ConfigInvalid("controller.execOutputLimit must be positive".to_string()));
        }
        for policy in &self.k8s.services {
            if let Some(reason) = policy.invalid_reason() {
                warn!("Election policy {} is invalid and will be skipped: {}", policy, reason);
            }
        }
        Ok(())
    }

    pub fn services(&self) -> &[ServiceElection] {
        &self.k8s.services
    }

    /// The configuration printed by `export`.
    pub fn example() -> ControllerConfig {
        ControllerConfig {
            k8s: ElectionConfig {
                services: vec![
                    ServiceElection::auto("nginx"),
                    ServiceElection::verified(
                        "redis",
                        vec![
                            "sh".to_string(),
                            "-c".to_string(),
                            "redis-cli info replication | grep -c role:master".to_string(),
                        ],
                        "1",
                    ),
                ],
            },
            controller: RuntimeConfig::default(),
        }
    }
}

pub fn namespace_from_env() -> Result<String, Error> {
    match std::env::var(NAMESPACE_ENV) {
        Ok(namespace) if !namespace.is_empty() => Ok(namespace),
        _ => Err(Error::MissingNamespace(NAMESPACE_ENV)),
    }
}
