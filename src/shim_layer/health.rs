// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::Error;
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;
use warp::{Filter, Rejection, Reply};

/// The liveness probe: GET / answers a static OK!.
pub fn health_routes() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| "OK!")
}

pub async fn run_health_server<F>(addr: SocketAddr, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(health_routes().with(warp::trace::request()))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(Error::HealthServerBindFailed)?;
    info!("health endpoint listening on {}", bound);
    server.await;
    Ok(())
}
