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

//! Standalone entry point: a minimal `clap`-derived CLI around [`Config::load_from`], wired
//! against the in-memory fakes in `chainlake_common::ports` (§9 ambient stack).
//!
//! Production deployments supply their own `MetadataIndex`/`ObjectStore`/`Parser`/`ProofSource`/
//! `ProofValidator` adapters and call [`application::run`] directly — those backends are upstream
//! ingestion's concern and out of scope here, the same role `indexer-standalone` plays for the
//! teacher workspace relative to `indexer-api`. This binary exists so the crate is runnable out
//! of the box.

use anyhow::Context;
use chainlake_api::{application, config::Config};
use chainlake_common::{
    config::ConfigExt,
    ports::{InMemoryIndex, InMemoryObjectStore, InMemoryParser, InMemoryProofSource, InMemoryProofValidator},
    telemetry,
};
use clap::Parser;
use log::{error, info};
use std::{panic, path::PathBuf};
use tokio::signal::unix::{SignalKind, signal};

/// Serves the `ChainLakeService` gRPC surface against an in-memory metadata index and object
/// store; point `--config` at a YAML file to override the built-in defaults.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML file merged over the built-in defaults (lowest priority; `CHAINLAKE_`-prefixed
    /// environment variables still win).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    panic::set_hook(Box::new(|panic| error!(panic:%; "process panicked")));

    if let Err(error) = run(cli).await {
        let error = format!("{error:#}");
        error!(error; "process exited with ERROR");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.as_deref()).context("load configuration")?;

    telemetry::init_logging(&config.telemetry_config.logging_config);
    telemetry::init_metrics(&config.telemetry_config.metrics_config);

    info!(config:?; "starting chainlake-api");

    let sigterm = signal(SignalKind::terminate()).context("register SIGTERM handler")?;

    let index = InMemoryIndex::default();
    let store = InMemoryObjectStore::default();

    application::run(
        config,
        index,
        store,
        InMemoryParser,
        InMemoryProofSource,
        InMemoryProofValidator,
        sigterm,
    )
    .await
    .context("run chainlake-api")
}
