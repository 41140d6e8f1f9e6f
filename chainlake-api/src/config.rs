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

//! Layered configuration for the `chainlake-api` binary, loaded via
//! [`chainlake_common::config::ConfigExt`].

use chainlake_common::domain::{AuthClient, AuthClientTable};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Full method path prefix of this crate's own service, used by the `RequestSurface` to
    /// decide which requests go through the `Throttler` and by `ErrorMapper`'s reflection
    /// pass-through check (§9 design note).
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Header carrying the raw client identity (§6); sanitized server-side per §4.6.
    #[serde(default = "default_client_id_header")]
    pub client_id_header: String,

    #[serde(default)]
    pub grpc_config: GrpcConfig,

    #[serde(default)]
    pub throttler_config: ThrottlerConfig,

    #[serde(default)]
    pub streaming_config: StreamingConfig,

    #[serde(default)]
    pub fetcher_config: FetcherConfig,

    #[serde(default)]
    pub resolver_config: ResolverConfig,

    #[serde(default)]
    pub feature_flags: FeatureFlags,

    #[serde(rename = "telemetry")]
    #[serde(default)]
    pub telemetry_config: chainlake_common::telemetry::Config,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service_name: default_service_name(),
            client_id_header: default_client_id_header(),
            grpc_config: GrpcConfig::default(),
            throttler_config: ThrottlerConfig::default(),
            streaming_config: StreamingConfig::default(),
            fetcher_config: FetcherConfig::default(),
            resolver_config: ResolverConfig::default(),
            feature_flags: FeatureFlags::default(),
            telemetry_config: chainlake_common::telemetry::Config::default(),
        }
    }
}

fn default_service_name() -> String {
    "chainlake.v1.ChainLakeService".to_string()
}

fn default_client_id_header() -> String {
    "x-client-id".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcConfig {
    pub listen_address: SocketAddr,

    /// Server-side keepalive ping interval for long-lived streams (§5).
    #[serde(with = "humantime_serde")]
    pub keepalive_interval: Duration,

    /// How long a client has to respond to a keepalive ping before the connection is dropped.
    #[serde(with = "humantime_serde")]
    pub keepalive_timeout: Duration,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        GrpcConfig {
            listen_address: "0.0.0.0:9000".parse().expect("valid socket address"),
            keepalive_interval: Duration::from_secs(5),
            keepalive_timeout: Duration::from_secs(5),
        }
    }
}

/// A single configured bearer token → client mapping (§3 `AuthClient`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClientEntry {
    pub client_id: String,
    pub rcu_per_second: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottlerConfig {
    /// Bucket applied to requests with no recognized bearer token (§4.1).
    pub default_rcu_per_second: u32,
    pub default_burst: u32,

    /// Per-method RCU weight overrides; methods absent here fall back to
    /// [`default_method_weight`] (§4.1: "unknown methods cost 1 RCU ... configured weights").
    #[serde(default)]
    pub method_weights: HashMap<String, u32>,

    /// Bearer token → client mapping; the token is the map key (§3 `AuthClient`).
    #[serde(default)]
    pub auth_clients: HashMap<String, AuthClientEntry>,
}

impl Default for ThrottlerConfig {
    fn default() -> Self {
        ThrottlerConfig {
            default_rcu_per_second: 100,
            default_burst: 100,
            method_weights: HashMap::new(),
            auth_clients: HashMap::new(),
        }
    }
}

impl ThrottlerConfig {
    /// Builds the frozen, process-wide [`AuthClientTable`] this config describes.
    pub fn build_auth_client_table(&self) -> AuthClientTable {
        let clients = self
            .auth_clients
            .iter()
            .map(|(token, entry)| {
                (
                    token.clone(),
                    AuthClient {
                        client_id: entry.client_id.clone(),
                        rcu_per_second: entry.rcu_per_second,
                        burst: entry.burst,
                    },
                )
            })
            .collect();

        let default = AuthClient::unknown(self.default_rcu_per_second, self.default_burst);
        AuthClientTable::new(clients, Some(default))
    }

    /// The RCU weight charged for `method`: a configured override, or [`default_method_weight`].
    pub fn method_weight(&self, method: &str) -> u32 {
        self.method_weights
            .get(method)
            .copied()
            .unwrap_or_else(|| default_method_weight(method))
    }
}

/// The built-in weight table referenced by §4.1 ("e.g. 10 for single-block fetches, 50 for range
/// fetches"); range methods are recognized by their `ByRange` suffix so new ones need no update
/// here, only an entry in `method_weights` if a different weight is required.
pub fn default_method_weight(method: &str) -> u32 {
    if method.ends_with("ByRange") {
        50
    } else if matches!(
        method,
        "GetLatestBlock" | "GetBlockFile" | "GetRawBlock" | "GetNativeBlock" | "GetRosettaBlock"
    ) {
        10
    } else {
        1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// `initialInterval` of the adaptive backoff (§4.5).
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// `maxElapsedTime`; exceeding it without a new event fails the stream with `ABORTED` (§4.5).
    #[serde(with = "humantime_serde")]
    pub max_no_event_time: Duration,

    /// Default batch size for `get_events` polls and `GetChainEvents` pulls.
    pub batch_size: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            interval: Duration::from_millis(500),
            max_no_event_time: Duration::from_secs(5 * 60),
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Bounded worker count for `PayloadFetcher::download_many` fan-out (§5).
    pub num_workers: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig { num_workers: 8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Hard cap on `endHeight - startHeight` for `GetRange` (§4.2); callers may request less.
    pub max_blocks: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig { max_blocks: 100 }
    }
}

/// Runtime toggles for the optional RPCs (§4.4, §6); disabled paths answer `UNIMPLEMENTED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub tx_resolution: bool,
    pub rosetta: bool,
    pub verified_account_state: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags {
            tx_resolution: cfg!(feature = "tx-index"),
            rosetta: cfg!(feature = "rosetta"),
            verified_account_state: cfg!(feature = "account-proofs"),
        }
    }
}
