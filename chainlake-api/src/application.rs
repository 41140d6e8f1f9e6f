// This file is part of chainlake.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process composition root: binds the serving core's collaborators, starts the gRPC listener
//! and drives the shutdown sequence of §3/§5 ("the `streamDone` signal is created at server
//! construction and closed exactly once at graceful shutdown").

use crate::{config::Config, infra};
use anyhow::Context;
use chainlake_common::ports::{MetadataIndex, ObjectStore, Parser, ProofSource, ProofValidator};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use log::{info, warn};
use std::time::Duration;
use stream_cancel::Tripwire;
use tokio::{net::TcpListener, signal::unix::Signal, task::JoinSet};

/// Runs the serving core to completion: binds `config.grpc_config.listen_address`, serves the
/// `ChainLakeService` (plus reflection) behind [`RequestSurface`](crate::surface::RequestSurface),
/// and returns once `sigterm` fires and every in-flight connection has drained.
///
/// `index`, `store`, `parser`, `proof_source` and `proof_validator` are the external
/// collaborators §1 declares out of scope; this crate only needs them to implement the trait
/// seams in `chainlake_common::ports`.
#[allow(clippy::too_many_arguments)]
pub async fn run<I, O, P, S, V>(
    config: Config,
    index: I,
    store: O,
    parser: P,
    proof_source: S,
    proof_validator: V,
    mut sigterm: Signal,
) -> anyhow::Result<()>
where
    I: MetadataIndex,
    O: ObjectStore,
    P: Parser,
    S: ProofSource,
    V: ProofValidator,
{
    // Created once here, dropped (closed) exactly once below (§3 Lifecycles).
    let (trigger, shutdown) = Tripwire::new();

    let app = infra::grpc::routes(&config, index, store, parser, proof_source, proof_validator, shutdown);

    let listen_address = config.grpc_config.listen_address;
    let listener = TcpListener::bind(listen_address)
        .await
        .with_context(|| format!("bind gRPC listener on {listen_address}"))?;
    info!(listen_address:%; "chainlake-api listening");

    let keepalive_interval = config.grpc_config.keepalive_interval;
    let keepalive_timeout = config.grpc_config.keepalive_timeout;

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer_address) = match accepted {
                    Ok(accepted) => accepted,
                    Err(error) => {
                        warn!(error:%; "failed to accept connection");
                        continue;
                    }
                };

                let service = TowerToHyperService::new(app.clone());
                connections.spawn(serve_connection(socket, service, keepalive_interval, keepalive_timeout, peer_address.to_string()));
            }

            _ = sigterm.recv() => {
                warn!("SIGTERM received, shutting down");
                break;
            }
        }
    }

    // Closes `shutdown`; active streams observe it on their next select and end with a
    // retryable `ABORTED` (§4.5, §5). Unary handlers already in flight are unaffected and are
    // drained below before this function returns.
    drop(trigger);

    while connections.join_next().await.is_some() {}

    Ok(())
}

async fn serve_connection(
    socket: tokio::net::TcpStream,
    service: TowerToHyperService<axum::Router>,
    keepalive_interval: Duration,
    keepalive_timeout: Duration,
    peer_address: String,
) {
    let io = TokioIo::new(socket);

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http2()
        .keep_alive_interval(keepalive_interval)
        .keep_alive_timeout(keepalive_timeout);

    let result = builder.serve_connection(io, service).await;

    if let Err(error) = result {
        warn!(peer_address, error:?; "connection terminated with error");
    }
}
