// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use active_standby_controller::config::{namespace_from_env, ControllerConfig, CONFIG_PATH_ENV};
use active_standby_controller::external_shim_layer::VerificationRunner;
use active_standby_controller::shim_layer::cluster_accessor::KubeClusterAccessor;
use active_standby_controller::shim_layer::controller_runtime::run_controller;
use active_standby_controller::shim_layer::health::run_health_server;
use anyhow::{anyhow, Result};
use kube::Client;
use std::net::SocketAddr;
use std::{env, sync::Arc};
use tokio::sync::oneshot;
use tracing::*;
use tracing_subscriber::EnvFilter;

// Resolves on SIGINT, or SIGTERM where available, the way kube-rs' shutdown_on_signal does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

async fn run(config_path: String) -> Result<()> {
    let config = ControllerConfig::from_path(&config_path)?;
    let namespace = namespace_from_env()?;
    info!("Setting namespace: {}", namespace);

    let client = Client::try_default().await?;
    let accessor = Arc::new(KubeClusterAccessor::new(
        client,
        namespace,
        config.controller.exec_output_limit,
    ));
    let runner = VerificationRunner::new(accessor.clone(), config.controller.exec_timeout());

    let (health_stop, health_stopped) = oneshot::channel::<()>();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.controller.health_port));
    let health = tokio::spawn(async move {
        let stopped = async {
            health_stopped.await.ok();
        };
        if let Err(err) = run_health_server(addr, stopped).await {
            error!("{}", err);
        }
    });

    run_controller(
        config.services(),
        accessor.as_ref(),
        &runner,
        config.controller.reconcile_interval(),
        shutdown_signal(),
    )
    .await;

    let _ = health_stop.send(());
    health.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).cloned().unwrap_or_default();
    if cmd == "export" {
        println!("{}", serde_yaml::to_string(&ControllerConfig::example())?);
    } else if cmd == "run" {
        let config_path = args
            .get(2)
            .cloned()
            .or_else(|| env::var(CONFIG_PATH_ENV).ok())
            .ok_or_else(|| anyhow!("no config path given; pass it after \"run\" or set {}", CONFIG_PATH_ENV))?;
        info!("running active-standby-controller with config {}", config_path);
        run(config_path).await?;
    } else {
        error!("wrong command; please use \"export\" or \"run\"");
    }
    Ok(())
}
