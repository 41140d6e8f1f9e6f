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

//! Labeled counters for requests, served items and delivered events (§2, §4.5, §4.6).
//!
//! `error{method, status}` is recorded by [`chainlake_common::error::ErrorMapper`] itself.
//! `request{service, method, clientId, status}` is recorded twice over a call's lifetime, at
//! different layers, for two different reasons: `RequestSurface` records a `RESOURCE_EXHAUSTED`
//! outcome at admission time because a throttled call never reaches a handler to record anything
//! else; every other outcome is recorded by the service impl's `observe` wrapper once the handler
//! has actually run, so the status label reflects what the caller received.

use chainlake_common::domain::EventType;

pub fn request(service: &str, method: &str, client_id: &str, status: &str) {
    metrics::counter!(
        "request",
        "service" => service.to_string(),
        "method" => method.to_string(),
        "clientId" => client_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn blocks_served(format: &str, count: u64) {
    metrics::counter!("blocks_served", "format" => format.to_string()).increment(count);
}

pub fn events_served(event_type: EventType, client_id: &str, event_tag: u32) {
    let event_type = match event_type {
        EventType::BlockAdded => "BLOCK_ADDED",
        EventType::BlockRemoved => "BLOCK_REMOVED",
    };

    metrics::counter!(
        "events_served",
        "type" => event_type,
        "clientId" => client_id.to_string(),
        "eventTag" => event_tag.to_string()
    )
    .increment(1);
}
