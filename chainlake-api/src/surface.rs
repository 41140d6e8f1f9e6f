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

//! The single axum middleware layer every unary and streaming call passes through before it
//! reaches the `tonic` service: method identification, bearer-token/client-id resolution and
//! admission control (§4.1, §4.6).
//!
//! Implemented as `axum::middleware::from_fn_with_state` rather than a `tonic::Interceptor`
//! because step 1 below needs the HTTP request path, which a `tonic::Interceptor` does not see.

use crate::{config::ThrottlerConfig, throttler::Throttler};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chainlake_common::domain::{AuthClient, AuthClientTable, ClientContext};
use secrecy::SecretString;
use tonic::{Code, Status};

/// The service this crate serves, identified by its fully qualified proto name (e.g.
/// `chainlake.v1.ChainLakeService`). Any other service path (notably `grpc.reflection.*`) bypasses
/// admission control entirely and is forwarded unchanged — see [`ErrorMapper`]'s doc comment.
///
/// [`ErrorMapper`]: chainlake_common::error::ErrorMapper
#[derive(Clone)]
pub struct RequestSurface {
    service_name: String,
    client_id_header: HeaderName,
    throttler_config: ThrottlerConfig,
    auth_clients: AuthClientTable,
    throttler: std::sync::Arc<Throttler>,
}

impl RequestSurface {
    pub fn new(service_name: String, client_id_header: &str, throttler_config: ThrottlerConfig) -> Self {
        let auth_clients = throttler_config.build_auth_client_table();
        let client_id_header =
            HeaderName::from_bytes(client_id_header.as_bytes()).expect("valid client id header name");

        RequestSurface {
            service_name,
            client_id_header,
            throttler: std::sync::Arc::new(Throttler::new()),
            auth_clients,
            throttler_config,
        }
    }

    /// Splits a request path of the form `/service/method` into its two parts. A path with no
    /// slash (should not occur for a well-formed gRPC call) is treated as an empty service with
    /// the whole path as the method.
    fn parse_path(path: &str) -> (&str, &str) {
        let trimmed = path.trim_start_matches('/');
        match trimmed.rsplit_once('/') {
            Some((service, method)) => (service, method),
            None => ("", trimmed),
        }
    }

    fn bearer_token(request: &Request) -> Option<SecretString> {
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| SecretString::from(token.to_string()))
    }

    fn client_context(&self, request: &Request, auth_client: &AuthClient) -> ClientContext {
        // A token-resolved identity is authoritative; the client-id header is only a fallback
        // identity for callers with no recognized bearer token (§3, §4.6).
        if auth_client.client_id != "unknown" {
            return ClientContext {
                client_id: auth_client.client_id.clone(),
            };
        }

        request
            .headers()
            .get(&self.client_id_header)
            .and_then(|value| value.to_str().ok())
            .map(ClientContext::sanitize)
            .unwrap_or_else(ClientContext::unknown)
    }

    pub async fn enforce(State(surface): State<RequestSurface>, mut request: Request, next: Next) -> Response {
        let (service, method) = Self::parse_path(request.uri().path());

        if service != surface.service_name {
            return next.run(request).await;
        }
        let method = method.to_string();

        let token = Self::bearer_token(&request);
        let auth_client = surface.auth_clients.resolve(token.as_ref());
        let client_context = surface.client_context(&request, &auth_client);

        let weight = surface.throttler_config.method_weight(&method);

        if !surface.throttler.allow_n(&auth_client, weight) {
            crate::metrics::request(&surface.service_name, &method, &client_context.client_id, "RESOURCE_EXHAUSTED");

            let status = Status::new(
                Code::ResourceExhausted,
                format!("rate limit exceeded for client {}", client_context.client_id),
            );
            return status.to_http::<Body>();
        }

        // The handler's own outcome (success or mapped error) is recorded by the service impl
        // once it actually runs — see `observe` in `infra::grpc::v1` — since "OK" here would be
        // wrong for any request this middleware admits but the handler later fails (§4.6 step 4).
        request.extensions_mut().insert(client_context);
        request.extensions_mut().insert(auth_client);

        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_splits_service_and_method() {
        let (service, method) =
            RequestSurface::parse_path("/chainlake.v1.ChainLakeService/GetLatestBlock");
        assert_eq!(service, "chainlake.v1.ChainLakeService");
        assert_eq!(method, "GetLatestBlock");
    }

    #[test]
    fn test_parse_path_handles_missing_slash() {
        let (service, method) = RequestSurface::parse_path("GetLatestBlock");
        assert_eq!(service, "");
        assert_eq!(method, "GetLatestBlock");
    }
}
