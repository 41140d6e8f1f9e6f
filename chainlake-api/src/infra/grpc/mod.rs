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

pub mod v1;

use crate::{config::Config, surface::RequestSurface};
use axum::{Router, middleware};
use chainlake_common::ports::{MetadataIndex, ObjectStore, Parser, ProofSource, ProofValidator};
use stream_cancel::Tripwire;
use tonic::service::Routes;

const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("chainlake");

/// Builds the axum router serving the `ChainLakeService` alongside gRPC server reflection, with
/// [`RequestSurface`] layered over both (§4.1, §4.6).
#[allow(clippy::too_many_arguments)]
pub fn routes<I, O, P, S, V>(
    config: &Config,
    index: I,
    store: O,
    parser: P,
    proof_source: S,
    proof_validator: V,
    shutdown: Tripwire,
) -> Router
where
    I: MetadataIndex,
    O: ObjectStore,
    P: Parser,
    S: ProofSource,
    V: ProofValidator,
{
    let surface = RequestSurface::new(
        config.service_name.clone(),
        &config.client_id_header,
        config.throttler_config.clone(),
    );

    let service = v1::chain_lake_service(config, index, store, parser, proof_source, proof_validator, shutdown);

    Routes::new(service)
        .add_service(v1::reflection_service())
        .into_axum_router()
        .layer(middleware::from_fn_with_state(surface, RequestSurface::enforce))
}
