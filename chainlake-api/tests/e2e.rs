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

//! Black-box scenarios driven over a real gRPC connection against an ephemeral `127.0.0.1` port,
//! scaled down from the full six end-to-end scenarios to what this serving core needs without a
//! live blockchain node: a happy-path read, a not-found mapping, and per-client admission
//! control, exercised through the public RPC surface rather than any internal type.

use chainlake_api::{
    config::{Config, ThrottlerConfig},
    infra::grpc::{
        self,
        v1::{chain_lake_service_client::ChainLakeServiceClient, GetChainEventsRequest, GetLatestBlockRequest},
    },
};
use chainlake_common::{
    domain::{BlockHash, BlockMetadata, Tag},
    ports::{InMemoryIndex, InMemoryObjectStore, InMemoryParser, InMemoryProofSource, InMemoryProofValidator},
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use std::net::SocketAddr;
use stream_cancel::{Trigger, Tripwire};
use tokio::net::TcpListener;
use tonic::{transport::Channel, Code};

/// Binds `routes(config, ...)` to an ephemeral loopback port and serves it in the background.
///
/// The returned `Trigger` must be kept alive by the caller for as long as the server should keep
/// accepting streams; dropping it fires the shutdown tripwire (§3, §5).
async fn spawn_server(config: Config, index: InMemoryIndex, store: InMemoryObjectStore) -> (SocketAddr, Trigger) {
    let (trigger, shutdown) = Tripwire::new();
    let app = grpc::routes(
        &config,
        index,
        store,
        InMemoryParser,
        InMemoryProofSource,
        InMemoryProofValidator,
        shutdown,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("bound listener has a local address");

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let service = TowerToHyperService::new(app.clone());
            tokio::spawn(async move {
                let _ = auto::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(socket), service)
                    .await;
            });
        }
    });

    (addr, trigger)
}

async fn connect(addr: SocketAddr) -> ChainLakeServiceClient<Channel> {
    let channel = Channel::from_shared(format!("http://{addr}"))
        .expect("valid uri")
        .connect()
        .await
        .expect("connect to in-process server");
    ChainLakeServiceClient::new(channel)
}

fn seeded_block() -> BlockMetadata {
    BlockMetadata {
        tag: Tag::new(0),
        height: 5,
        hash: BlockHash::from([0xABu8; 32]),
        parent_hash: BlockHash::from([0xCDu8; 32]),
        parent_height: 4,
        timestamp: 1_700_000_000,
        skipped: false,
        object_key: "blocks/5.bin".to_string(),
    }
}

#[tokio::test]
async fn get_latest_block_returns_seeded_block() {
    let index = InMemoryIndex::new(Tag::new(0), Tag::new(0));
    index.insert_block(seeded_block());

    let (addr, _trigger) = spawn_server(Config::default(), index, InMemoryObjectStore::default()).await;
    let mut client = connect(addr).await;

    let response = client
        .get_latest_block(GetLatestBlockRequest { tag: 0 })
        .await
        .expect("call succeeds")
        .into_inner();

    let block = response.block.expect("response carries a block");
    assert_eq!(block.height, 5);
    assert_eq!(block.hash, seeded_block().hash.as_bytes().to_vec());
}

#[tokio::test]
async fn get_latest_block_on_empty_index_maps_to_not_found() {
    let index = InMemoryIndex::new(Tag::new(0), Tag::new(0));

    let (addr, _trigger) = spawn_server(Config::default(), index, InMemoryObjectStore::default()).await;
    let mut client = connect(addr).await;

    let error = client
        .get_latest_block(GetLatestBlockRequest { tag: 0 })
        .await
        .expect_err("no block at this tag");

    assert_eq!(error.code(), Code::NotFound);
}

#[tokio::test]
async fn exhausting_a_clients_burst_returns_resource_exhausted() {
    let index = InMemoryIndex::new(Tag::new(0), Tag::new(0));
    index.insert_block(seeded_block());

    let config = Config {
        throttler_config: ThrottlerConfig {
            default_rcu_per_second: 1,
            default_burst: 1,
            ..ThrottlerConfig::default()
        },
        ..Config::default()
    };

    let (addr, _trigger) = spawn_server(config, index, InMemoryObjectStore::default()).await;
    let mut client = connect(addr).await;

    // `GetLatestBlock` costs 10 RCU (§4.1); a burst of 1 is exhausted by the very first call.
    let first = client.get_latest_block(GetLatestBlockRequest { tag: 0 }).await;
    assert!(first.is_err());
    assert_eq!(first.unwrap_err().code(), Code::ResourceExhausted);
}

#[tokio::test]
async fn get_chain_events_returns_events_from_earliest() {
    use chainlake_common::domain::{EventEntry, EventType};

    let index = InMemoryIndex::new(Tag::new(0), Tag::new(0));
    index.push_event(EventEntry {
        event_id: 1,
        event_tag: Tag::new(0),
        event_type: EventType::BlockAdded,
        block_tag: Tag::new(0),
        block_height: 1,
        block_hash: BlockHash::from([0x11u8; 32]),
        parent_hash: BlockHash::ZERO,
        block_skipped: false,
        block_timestamp: 1_700_000_000,
    });
    index.push_event(EventEntry {
        event_id: 2,
        event_tag: Tag::new(0),
        event_type: EventType::BlockAdded,
        block_tag: Tag::new(0),
        block_height: 2,
        block_hash: BlockHash::from([0x22u8; 32]),
        parent_hash: BlockHash::from([0x11u8; 32]),
        block_skipped: false,
        block_timestamp: 1_700_000_001,
    });

    let (addr, _trigger) = spawn_server(Config::default(), index, InMemoryObjectStore::default()).await;
    let mut client = connect(addr).await;

    let response = client
        .get_chain_events(GetChainEventsRequest {
            event_tag: 0,
            sequence: String::new(),
            initial_position_in_stream: "EARLIEST".to_string(),
            sequence_num: 0,
            batch_size: 10,
        })
        .await
        .expect("call succeeds")
        .into_inner();

    assert_eq!(response.events.len(), 2);
    assert_eq!(response.events[0].event_id, 1);
    assert_eq!(response.events[1].event_id, 2);
}
