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

//! Ambient logging and metrics setup (§9). The serving core's components only ever call into
//! the `log` and `metrics` facades; this module wires those facades to concrete sinks once at
//! process startup. Which sink a deployment points at (stdout JSON vs. a collector) is
//! explicitly out of scope (§1) — only the call sites and this minimal default wiring are not.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging_config: LoggingConfig,

    #[serde(default)]
    pub metrics_config: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging_config: LoggingConfig::default(),
            metrics_config: MetricsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level emitted; one of `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Address the Prometheus scrape endpoint listens on.
    pub listen_address: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            listen_address: "0.0.0.0:9090".parse().expect("valid socket address"),
        }
    }
}

/// Initializes structured stdout logging via the `log` + `logforth` pairing.
pub fn init_logging(config: &LoggingConfig) {
    let level = config.level.parse().unwrap_or(log::LevelFilter::Info);

    logforth::starter_log::builder()
        .filter(level)
        .apply();
}

/// Installs the process-wide Prometheus recorder and starts its scrape listener.
pub fn init_metrics(config: &MetricsConfig) {
    if let Err(error) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(config.listen_address)
        .install()
    {
        log::error!(error:%; "failed to install Prometheus metrics recorder");
    }
}
