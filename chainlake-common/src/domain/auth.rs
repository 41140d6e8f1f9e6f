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

use derive_more::Debug;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// The client identity and quota a bearer token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClient {
    pub client_id: String,
    pub rcu_per_second: u32,
    pub burst: u32,
}

impl AuthClient {
    /// The bucket used for requests that carry no recognized bearer token.
    pub fn unknown(default_rcu_per_second: u32, default_burst: u32) -> Self {
        AuthClient {
            client_id: "unknown".to_string(),
            rcu_per_second: default_rcu_per_second,
            burst: default_burst,
        }
    }
}

/// The process-wide, read-only-after-startup map from bearer token to [`AuthClient`].
///
/// Tokens are the map's keys; `Debug` is redacted so they never leak into logs.
#[derive(Debug, Clone, Default)]
pub struct AuthClientTable {
    #[debug(skip)]
    clients: HashMap<String, AuthClient>,
    default: Option<AuthClient>,
}

impl AuthClientTable {
    pub fn new(clients: HashMap<String, AuthClient>, default: Option<AuthClient>) -> Self {
        AuthClientTable { clients, default }
    }

    /// Resolves a bearer token to its configured client, falling back to the default bucket
    /// (or [`AuthClient::unknown`] if none was configured) for missing/unrecognized tokens.
    pub fn resolve(&self, token: Option<&SecretString>) -> AuthClient {
        token
            .and_then(|token| self.clients.get(token.expose_secret()))
            .cloned()
            .or_else(|| self.default.clone())
            .unwrap_or_else(|| AuthClient::unknown(1, 1))
    }
}

/// Per-request, sanitized client identity threaded through the handler chain.
///
/// A typed extension value rather than a thread-local, so it composes cleanly with `tonic`'s
/// per-request `Extensions` map (§9 design note).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub client_id: String,
}

impl ClientContext {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        ClientContext {
            client_id: Self::UNKNOWN.to_string(),
        }
    }

    /// Sanitizes a raw client-id header value per §4.6: trim, split on `:` and keep the first
    /// part, lowercase letters, map whitespace to `_`, drop characters outside
    /// `[letters, digits, _, -, /]`; empty result becomes `unknown`.
    pub fn sanitize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let first_segment = trimmed.split(':').next().unwrap_or("");

        let sanitized: String = first_segment
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .map(|c| if c.is_ascii_uppercase() { c.to_ascii_lowercase() } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
            .collect();

        if sanitized.is_empty() {
            ClientContext::unknown()
        } else {
            ClientContext {
                client_id: sanitized,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_trims_splits_and_lowercases() {
        let ctx = ClientContext::sanitize("  My-Client:session-xyz  ");
        assert_eq!(ctx.client_id, "my-client");
    }

    #[test]
    fn test_sanitize_empty_after_split_is_unknown() {
        let ctx = ClientContext::sanitize(":");
        assert_eq!(ctx.client_id, ClientContext::UNKNOWN);
    }

    #[test]
    fn test_sanitize_maps_whitespace_and_keeps_slash() {
        let ctx = ClientContext::sanitize("foo bar/baz");
        assert_eq!(ctx.client_id, "foo_bar/baz");
    }

    #[test]
    fn test_sanitize_drops_disallowed_characters() {
        let ctx = ClientContext::sanitize("a!b@c#d");
        assert_eq!(ctx.client_id, "abcd");
    }

    #[test]
    fn test_auth_client_table_resolves_unknown_without_default() {
        let table = AuthClientTable::new(HashMap::new(), None);
        let client = table.resolve(None);
        assert_eq!(client.client_id, "unknown");
    }
}
