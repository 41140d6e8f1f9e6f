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

//! Per-client weighted token bucket (§4.1). `AllowN` is non-blocking and safe under concurrent
//! callers: each client's bucket is an independent [`governor`] rate limiter, created lazily from
//! its [`AuthClient`] quota and cached in a [`DashMap`] keyed by `clientId`.

use chainlake_common::domain::AuthClient;
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, sync::Arc};

type Bucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A per-client token-bucket admission gate.
///
/// No queuing and no retries (§4.1): a call either consumes its cost immediately or is rejected.
#[derive(Debug, Default)]
pub struct Throttler {
    buckets: DashMap<String, Arc<Bucket>>,
}

impl Throttler {
    pub fn new() -> Self {
        Throttler::default()
    }

    /// Admits or rejects `n` RCUs of cost for `client`. An admitted request has already paid its
    /// cost regardless of what the handler does next (§3 invariant c).
    pub fn allow_n(&self, client: &AuthClient, n: u32) -> bool {
        let bucket = self.bucket_for(client);
        let n = NonZeroU32::new(n).unwrap_or(nonzero!(1u32));

        match bucket.check_n(n) {
            Ok(result) => result.is_ok(),
            // `n` exceeds the bucket's burst capacity outright; it can never succeed.
            Err(_) => false,
        }
    }

    fn bucket_for(&self, client: &AuthClient) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.get(&client.client_id) {
            return bucket.clone();
        }

        self.buckets
            .entry(client.client_id.clone())
            .or_insert_with(|| Arc::new(Self::build_bucket(client.rcu_per_second, client.burst)))
            .clone()
    }

    fn build_bucket(rcu_per_second: u32, burst: u32) -> Bucket {
        let rcu_per_second = NonZeroU32::new(rcu_per_second).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(burst).unwrap_or(rcu_per_second);

        let quota = Quota::per_second(rcu_per_second).allow_burst(burst);
        RateLimiter::direct_with_clock(quota, DefaultClock::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(rcu_per_second: u32, burst: u32) -> AuthClient {
        AuthClient {
            client_id: "acme".to_string(),
            rcu_per_second,
            burst,
        }
    }

    #[test]
    fn test_throttle_accounting_three_calls_at_weight_fifty() {
        let throttler = Throttler::new();
        let client = client(100, 100);

        assert!(throttler.allow_n(&client, 50));
        assert!(throttler.allow_n(&client, 50));
        assert!(!throttler.allow_n(&client, 50));
    }

    #[test]
    fn test_independent_clients_have_independent_buckets() {
        let throttler = Throttler::new();
        let a = AuthClient {
            client_id: "a".to_string(),
            ..client(10, 10)
        };
        let b = AuthClient {
            client_id: "b".to_string(),
            ..client(10, 10)
        };

        for _ in 0..10 {
            assert!(throttler.allow_n(&a, 1));
        }
        assert!(!throttler.allow_n(&a, 1));
        assert!(throttler.allow_n(&b, 1));
    }

    #[test]
    fn test_twenty_calls_at_weight_fifty_against_rate_1000_burst_1000() {
        let throttler = Throttler::new();
        let client = client(1000, 1000);

        for _ in 0..20 {
            assert!(throttler.allow_n(&client, 50));
        }
        assert!(!throttler.allow_n(&client, 50));
    }
}
