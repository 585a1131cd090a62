// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod active_standby_e2e;
pub mod common;

use active_standby_e2e::{active_standby_e2e_test, failover_e2e_test};
use common::Error;
use std::env;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).cloned().unwrap_or_default();
    match cmd.as_str() {
        "active-standby" => {
            info!("Running active-standby end-to-end test");
            active_standby_e2e_test().await
        }
        "failover" => {
            info!("Running active-standby end-to-end test for failover");
            failover_e2e_test().await
        }
        _ => {
            error!("Please specify one test: active-standby or failover");
            Ok(())
        }
    }
}
