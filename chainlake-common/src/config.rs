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

//! Layered configuration loading shared by every chainlake binary: defaults, overlaid by a
//! `CHAINLAKE_`-prefixed environment block, via a `figment`-based `ConfigExt` convention.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

/// Blanket extension implemented for every binary's top-level `Config` struct.
pub trait ConfigExt: Sized + Serialize + DeserializeOwned + Default {
    /// Loads configuration from (in ascending priority): the type's `Default`, an optional
    /// `config.yaml` in the current directory, and `CHAINLAKE_`-prefixed environment variables
    /// using `__` as the nested-key separator.
    fn load() -> figment::Result<Self> {
        Self::load_from(None)
    }

    /// As [`Self::load`], but `path` (when given, e.g. from a `--config` CLI flag) overrides the
    /// default `config.yaml` lookup in the current directory.
    fn load_from(path: Option<&Path>) -> figment::Result<Self> {
        let yaml = match path {
            Some(path) => Yaml::file(path),
            None => Yaml::file("config.yaml"),
        };

        Figment::from(Serialized::defaults(Self::default()))
            .merge(yaml)
            .merge(Env::prefixed("CHAINLAKE_").split("__"))
            .extract()
    }
}

impl<T> ConfigExt for T where T: Serialize + DeserializeOwned + Default {}
