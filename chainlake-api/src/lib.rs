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

//! The serving-tier RPC gateway: request dispatch, admission control, block/transaction
//! resolution, payload fan-out and event-log streaming over a `tonic` gRPC surface.

pub mod application;
pub mod config;
pub mod fetcher;
pub mod infra;
pub mod metrics;
pub mod resolver;
pub mod streamer;
pub mod surface;
pub mod throttler;
