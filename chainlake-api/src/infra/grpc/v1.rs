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

tonic::include_proto!("chainlake.v1");

use super::FILE_DESCRIPTOR_SET;
use crate::{
    config::{Config, FeatureFlags},
    fetcher::PayloadFetcher,
    resolver::{BlockResolver, TxResolver},
    streamer::{EventStreamer, StreamRequest},
};
use chain_lake_service_server::{ChainLakeService, ChainLakeServiceServer};
use chainlake_common::{
    domain,
    error::{ErrorKind, ErrorMapper, InternalError},
    ports::{MetadataIndex, ObjectStore, Parser, ProofSource, ProofValidator},
};
use stream_cancel::Tripwire;
use tokio::{sync::mpsc, task};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Code, Request, Response, Status};
use tonic_reflection::server::v1::{ServerReflection, ServerReflectionServer};

pub fn reflection_service() -> ServerReflectionServer<impl ServerReflection> {
    tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .expect("v1 reflection can be built")
}

#[allow(clippy::too_many_arguments)]
pub fn chain_lake_service<I, O, P, S, V>(
    config: &Config,
    index: I,
    store: O,
    parser: P,
    proof_source: S,
    proof_validator: V,
    shutdown: Tripwire,
) -> ChainLakeServiceServer<ChainLakeServiceImpl<I, O, P, S, V>>
where
    I: MetadataIndex,
    O: ObjectStore,
    P: Parser,
    S: ProofSource,
    V: ProofValidator,
{
    let streamer = EventStreamer::new(
        index.clone(),
        config.streaming_config.interval,
        config.streaming_config.max_no_event_time,
    );

    ChainLakeServiceServer::new(ChainLakeServiceImpl {
        service_name: config.service_name.clone(),
        block_resolver: BlockResolver::new(index.clone()),
        tx_resolver: TxResolver::new(index.clone()),
        fetcher: PayloadFetcher::new(store, config.fetcher_config.num_workers),
        streamer,
        index,
        parser,
        proof_source,
        proof_validator,
        feature_flags: config.feature_flags.clone(),
        max_blocks: config.resolver_config.max_blocks,
        shutdown,
    })
}

pub struct ChainLakeServiceImpl<I, O, P, S, V> {
    service_name: String,
    block_resolver: BlockResolver<I>,
    tx_resolver: TxResolver<I>,
    fetcher: PayloadFetcher<O>,
    streamer: EventStreamer<I>,
    index: I,
    parser: P,
    proof_source: S,
    proof_validator: V,
    feature_flags: FeatureFlags,
    max_blocks: u64,
    shutdown: Tripwire,
}

/// Records the `request{service, method, clientId, status}` counter of §4.6 step 4 with the
/// *actual* outcome of the handler, once it has run — as opposed to the admission-time counter
/// `RequestSurface` records for a throttled call, which never reaches a handler at all.
fn observe<T>(
    service: &str,
    method: &str,
    client_id: &str,
    result: Result<Response<T>, Status>,
) -> Result<Response<T>, Status> {
    let code = result.as_ref().map_or_else(|status| status.code(), |_| Code::Ok);
    crate::metrics::request(service, method, client_id, &code.to_string());
    result
}

fn client_id<T>(request: &Request<T>) -> String {
    request
        .extensions()
        .get::<domain::ClientContext>()
        .map(|context| context.client_id.clone())
        .unwrap_or_else(|| domain::ClientContext::unknown().client_id)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn hash_from(bytes: &[u8]) -> Result<domain::BlockHash, Status> {
    domain::BlockHash::try_from(bytes)
        .map_err(|_| Status::invalid_argument("invalid hash, expected 32 bytes"))
}

fn tx_hash_from(bytes: &[u8]) -> Result<domain::TransactionHash, Status> {
    domain::TransactionHash::try_from(bytes)
        .map_err(|_| Status::invalid_argument("invalid transaction hash, expected 32 bytes"))
}

fn block_metadata_to_proto(meta: domain::BlockMetadata) -> BlockMetadata {
    BlockMetadata {
        tag: meta.tag.get(),
        height: meta.height,
        hash: meta.hash.as_bytes().to_vec(),
        parent_hash: meta.parent_hash.as_bytes().to_vec(),
        parent_height: meta.parent_height,
        timestamp: meta.timestamp,
        skipped: meta.skipped,
    }
}

fn block_file_to_proto(file: domain::BlockFile) -> BlockFile {
    match file {
        domain::BlockFile::Skipped { tag, height } => BlockFile {
            tag: tag.get(),
            height,
            skipped: true,
            hash: Vec::new(),
            parent_hash: Vec::new(),
            parent_height: 0,
            file_url: String::new(),
            compression: String::new(),
        },
        domain::BlockFile::Available {
            tag,
            hash,
            parent_hash,
            height,
            parent_height,
            file_url,
            compression,
        } => BlockFile {
            tag: tag.get(),
            height,
            skipped: false,
            hash: hash.as_bytes().to_vec(),
            parent_hash: parent_hash.as_bytes().to_vec(),
            parent_height,
            file_url,
            compression: compression_name(compression).to_string(),
        },
    }
}

fn compression_name(compression: domain::Compression) -> &'static str {
    match compression {
        domain::Compression::None => "none",
        domain::Compression::Gzip => "gzip",
        domain::Compression::Zstd => "zstd",
    }
}

fn event_to_proto(event: domain::EventEntry) -> BlockchainEvent {
    let event_type = match event.event_type {
        domain::EventType::BlockAdded => EventType::BlockAdded,
        domain::EventType::BlockRemoved => EventType::BlockRemoved,
    };

    BlockchainEvent {
        event_id: event.event_id,
        event_tag: event.event_tag.get(),
        event_type: event_type as i32,
        block_tag: event.block_tag.get(),
        block_height: event.block_height,
        block_hash: event.block_hash.as_bytes().to_vec(),
        parent_hash: event.parent_hash.as_bytes().to_vec(),
        block_skipped: event.block_skipped,
        block_timestamp: event.block_timestamp,
        sequence: event.event_id.to_string(),
        sequence_num: event.event_id,
    }
}

#[tonic::async_trait]
impl<I, O, P, S, V> ChainLakeService for ChainLakeServiceImpl<I, O, P, S, V>
where
    I: MetadataIndex,
    O: ObjectStore,
    P: Parser,
    S: ProofSource,
    V: ProofValidator,
{
    type StreamChainEventsStream = ReceiverStream<Result<BlockchainEvent, Status>>;

    async fn get_latest_block(
        &self,
        request: Request<GetLatestBlockRequest>,
    ) -> Result<Response<GetLatestBlockResponse>, Status> {
        let client_id = client_id(&request);
        let tag = domain::Tag::new(request.into_inner().tag);

        let result = async {
            let block = self
                .block_resolver
                .get_latest(tag)
                .await
                .map_err(|error| ErrorMapper::map("GetLatestBlock", &client_id, &error))?;

            Ok(Response::new(GetLatestBlockResponse {
                block: Some(block_metadata_to_proto(block)),
            }))
        }
        .await;

        observe(&self.service_name, "GetLatestBlock", &client_id, result)
    }

    async fn get_block_file(
        &self,
        request: Request<GetBlockFileRequest>,
    ) -> Result<Response<GetBlockFileResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);
            let hash = hash_from(&req.hash)?;

            let meta = self
                .block_resolver
                .get_by_hash(tag, req.height, hash)
                .await
                .map_err(|error| ErrorMapper::map("GetBlockFile", &client_id, &error))?;

            let file = self.fetcher.presign_file(&meta);
            Ok(Response::new(GetBlockFileResponse {
                file: Some(block_file_to_proto(file)),
            }))
        }
        .await;

        observe(&self.service_name, "GetBlockFile", &client_id, result)
    }

    async fn get_block_files_by_range(
        &self,
        request: Request<GetBlockFilesByRangeRequest>,
    ) -> Result<Response<GetBlockFilesByRangeResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);

            let blocks = self
                .block_resolver
                .get_range(tag, req.start_height, req.end_height, self.max_blocks)
                .await
                .map_err(|error| ErrorMapper::map("GetBlockFilesByRange", &client_id, &error))?;

            crate::metrics::blocks_served("file", blocks.len() as u64);

            let files = blocks
                .iter()
                .map(|meta| block_file_to_proto(self.fetcher.presign_file(meta)))
                .collect();

            Ok(Response::new(GetBlockFilesByRangeResponse { files }))
        }
        .await;

        observe(&self.service_name, "GetBlockFilesByRange", &client_id, result)
    }

    async fn get_raw_block(
        &self,
        request: Request<GetRawBlockRequest>,
    ) -> Result<Response<GetRawBlockResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);
            let hash = hash_from(&req.hash)?;

            let meta = self
                .block_resolver
                .get_by_hash(tag, req.height, hash)
                .await
                .map_err(|error| ErrorMapper::map("GetRawBlock", &client_id, &error))?;

            let payload = self
                .fetcher
                .download_one(&meta)
                .await
                .map_err(|error| ErrorMapper::map("GetRawBlock", &client_id, &error))?;

            crate::metrics::blocks_served("raw", 1);

            Ok(Response::new(GetRawBlockResponse {
                block: Some(RawBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data: payload.0,
                }),
            }))
        }
        .await;

        observe(&self.service_name, "GetRawBlock", &client_id, result)
    }

    async fn get_raw_blocks_by_range(
        &self,
        request: Request<GetRawBlocksByRangeRequest>,
    ) -> Result<Response<GetRawBlocksByRangeResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);

            let metas = self
                .block_resolver
                .get_range(tag, req.start_height, req.end_height, self.max_blocks)
                .await
                .map_err(|error| ErrorMapper::map("GetRawBlocksByRange", &client_id, &error))?;

            let payloads = self
                .fetcher
                .download_many(&metas)
                .await
                .map_err(|error| ErrorMapper::map("GetRawBlocksByRange", &client_id, &error))?;

            crate::metrics::blocks_served("raw", metas.len() as u64);

            let blocks = metas
                .into_iter()
                .zip(payloads)
                .map(|(meta, payload)| RawBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data: payload.0,
                })
                .collect();

            Ok(Response::new(GetRawBlocksByRangeResponse { blocks }))
        }
        .await;

        observe(&self.service_name, "GetRawBlocksByRange", &client_id, result)
    }

    async fn get_native_block(
        &self,
        request: Request<GetNativeBlockRequest>,
    ) -> Result<Response<GetNativeBlockResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);
            let hash = hash_from(&req.hash)?;

            let meta = self
                .block_resolver
                .get_by_hash(tag, req.height, hash)
                .await
                .map_err(|error| ErrorMapper::map("GetNativeBlock", &client_id, &error))?;

            let payload = self
                .fetcher
                .download_one(&meta)
                .await
                .map_err(|error| ErrorMapper::map("GetNativeBlock", &client_id, &error))?;

            let data = self
                .parser
                .parse_native(&payload.0)
                .await
                .map_err(|error| {
                    ErrorMapper::map(
                        "GetNativeBlock",
                        &client_id,
                        &ErrorKind::InvalidParserInput(error.to_string()),
                    )
                })?;

            crate::metrics::blocks_served("native", 1);

            Ok(Response::new(GetNativeBlockResponse {
                block: Some(NativeBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data,
                }),
            }))
        }
        .await;

        observe(&self.service_name, "GetNativeBlock", &client_id, result)
    }

    async fn get_native_blocks_by_range(
        &self,
        request: Request<GetNativeBlocksByRangeRequest>,
    ) -> Result<Response<GetNativeBlocksByRangeResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let tag = domain::Tag::new(req.tag);

            let metas = self
                .block_resolver
                .get_range(tag, req.start_height, req.end_height, self.max_blocks)
                .await
                .map_err(|error| ErrorMapper::map("GetNativeBlocksByRange", &client_id, &error))?;

            let payloads = self
                .fetcher
                .download_many(&metas)
                .await
                .map_err(|error| ErrorMapper::map("GetNativeBlocksByRange", &client_id, &error))?;

            let mut blocks = Vec::with_capacity(metas.len());
            for (meta, payload) in metas.into_iter().zip(payloads) {
                let data = self.parser.parse_native(&payload.0).await.map_err(|error| {
                    ErrorMapper::map(
                        "GetNativeBlocksByRange",
                        &client_id,
                        &ErrorKind::InvalidParserInput(error.to_string()),
                    )
                })?;
                blocks.push(NativeBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data,
                });
            }

            crate::metrics::blocks_served("native", blocks.len() as u64);
            Ok(Response::new(GetNativeBlocksByRangeResponse { blocks }))
        }
        .await;

        observe(&self.service_name, "GetNativeBlocksByRange", &client_id, result)
    }

    async fn get_rosetta_block(
        &self,
        request: Request<GetRosettaBlockRequest>,
    ) -> Result<Response<GetRosettaBlockResponse>, Status> {
        let client_id = client_id(&request);

        let result = async {
            if !self.feature_flags.rosetta {
                return Err(ErrorMapper::map("GetRosettaBlock", &client_id, &ErrorKind::NotImplemented));
            }

            let req = request.into_inner();
            let tag = domain::Tag::new(req.tag);
            let hash = hash_from(&req.hash)?;

            let meta = self
                .block_resolver
                .get_by_hash(tag, req.height, hash)
                .await
                .map_err(|error| ErrorMapper::map("GetRosettaBlock", &client_id, &error))?;

            let payload = self
                .fetcher
                .download_one(&meta)
                .await
                .map_err(|error| ErrorMapper::map("GetRosettaBlock", &client_id, &error))?;

            let data = self
                .parser
                .parse_rosetta(&payload.0)
                .await
                .map_err(|error| {
                    ErrorMapper::map(
                        "GetRosettaBlock",
                        &client_id,
                        &ErrorKind::InvalidParserInput(error.to_string()),
                    )
                })?;

            crate::metrics::blocks_served("rosetta", 1);

            Ok(Response::new(GetRosettaBlockResponse {
                block: Some(RosettaBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data,
                }),
            }))
        }
        .await;

        observe(&self.service_name, "GetRosettaBlock", &client_id, result)
    }

    async fn get_rosetta_blocks_by_range(
        &self,
        request: Request<GetRosettaBlocksByRangeRequest>,
    ) -> Result<Response<GetRosettaBlocksByRangeResponse>, Status> {
        let client_id = client_id(&request);

        let result = async {
            if !self.feature_flags.rosetta {
                return Err(ErrorMapper::map(
                    "GetRosettaBlocksByRange",
                    &client_id,
                    &ErrorKind::NotImplemented,
                ));
            }

            let req = request.into_inner();
            let tag = domain::Tag::new(req.tag);

            let metas = self
                .block_resolver
                .get_range(tag, req.start_height, req.end_height, self.max_blocks)
                .await
                .map_err(|error| ErrorMapper::map("GetRosettaBlocksByRange", &client_id, &error))?;

            let payloads = self
                .fetcher
                .download_many(&metas)
                .await
                .map_err(|error| ErrorMapper::map("GetRosettaBlocksByRange", &client_id, &error))?;

            let mut blocks = Vec::with_capacity(metas.len());
            for (meta, payload) in metas.into_iter().zip(payloads) {
                let data = self.parser.parse_rosetta(&payload.0).await.map_err(|error| {
                    ErrorMapper::map(
                        "GetRosettaBlocksByRange",
                        &client_id,
                        &ErrorKind::InvalidParserInput(error.to_string()),
                    )
                })?;
                blocks.push(RosettaBlock {
                    metadata: Some(block_metadata_to_proto(meta)),
                    data,
                });
            }

            crate::metrics::blocks_served("rosetta", blocks.len() as u64);
            Ok(Response::new(GetRosettaBlocksByRangeResponse { blocks }))
        }
        .await;

        observe(&self.service_name, "GetRosettaBlocksByRange", &client_id, result)
    }

    async fn get_block_by_transaction(
        &self,
        request: Request<GetBlockByTransactionRequest>,
    ) -> Result<Response<GetBlockByTransactionResponse>, Status> {
        let client_id = client_id(&request);

        let result = async {
            if !self.feature_flags.tx_resolution {
                return Err(ErrorMapper::map(
                    "GetBlockByTransaction",
                    &client_id,
                    &ErrorKind::NotImplemented,
                ));
            }

            let req = request.into_inner();
            let tag = domain::Tag::new(req.tag);
            let tx_hash = tx_hash_from(&req.transaction_hash)?;

            let blocks = self
                .tx_resolver
                .resolve_blocks(tag, tx_hash)
                .await
                .map_err(|error| ErrorMapper::map("GetBlockByTransaction", &client_id, &error))?;

            Ok(Response::new(GetBlockByTransactionResponse {
                blocks: blocks.into_iter().map(block_metadata_to_proto).collect(),
            }))
        }
        .await;

        observe(&self.service_name, "GetBlockByTransaction", &client_id, result)
    }

    async fn get_native_transaction(
        &self,
        request: Request<GetNativeTransactionRequest>,
    ) -> Result<Response<GetNativeTransactionResponse>, Status> {
        let client_id = client_id(&request);

        let result = async {
            if !self.feature_flags.tx_resolution {
                return Err(ErrorMapper::map(
                    "GetNativeTransaction",
                    &client_id,
                    &ErrorKind::NotImplemented,
                ));
            }

            let req = request.into_inner();
            let tag = domain::Tag::new(req.tag);
            let tx_hash = tx_hash_from(&req.transaction_hash)?;

            let blocks = self
                .tx_resolver
                .resolve_blocks(tag, tx_hash)
                .await
                .map_err(|error| ErrorMapper::map("GetNativeTransaction", &client_id, &error))?;

            let mut transactions = Vec::with_capacity(blocks.len());
            for meta in blocks {
                let payload = self
                    .fetcher
                    .download_one(&meta)
                    .await
                    .map_err(|error| ErrorMapper::map("GetNativeTransaction", &client_id, &error))?;

                let data = self.parser.parse_native(&payload.0).await.map_err(|error| {
                    ErrorMapper::map(
                        "GetNativeTransaction",
                        &client_id,
                        &ErrorKind::InvalidParserInput(error.to_string()),
                    )
                })?;

                transactions.push(NativeTransaction {
                    block: Some(block_metadata_to_proto(meta)),
                    data,
                });
            }

            Ok(Response::new(GetNativeTransactionResponse { transactions }))
        }
        .await;

        observe(&self.service_name, "GetNativeTransaction", &client_id, result)
    }

    async fn get_verified_account_state(
        &self,
        request: Request<GetVerifiedAccountStateRequest>,
    ) -> Result<Response<GetVerifiedAccountStateResponse>, Status> {
        let client_id = client_id(&request);

        let result = async {
            if !self.feature_flags.verified_account_state {
                return Err(ErrorMapper::map(
                    "GetVerifiedAccountState",
                    &client_id,
                    &ErrorKind::NotImplemented,
                ));
            }

            let req = request.into_inner();
            let tag = domain::Tag::new(req.tag);

            let meta = self
                .block_resolver
                .get_by_height(tag, req.height)
                .await
                .map_err(|error| ErrorMapper::map("GetVerifiedAccountState", &client_id, &error))?;

            let payload = self
                .fetcher
                .download_one(&meta)
                .await
                .map_err(|error| ErrorMapper::map("GetVerifiedAccountState", &client_id, &error))?;

            let state = self.parser.parse_native(&payload.0).await.map_err(|error| {
                ErrorMapper::map(
                    "GetVerifiedAccountState",
                    &client_id,
                    &ErrorKind::InvalidParserInput(error.to_string()),
                )
            })?;

            let proof = self
                .proof_source
                .fetch_proof(&req.account, req.height)
                .await
                .map_err(|error| {
                    ErrorMapper::map(
                        "GetVerifiedAccountState",
                        &client_id,
                        &ErrorKind::Internal(InternalError(error.to_string())),
                    )
                })?;

            let verified = self.proof_validator.validate(&proof, &state).await.map_err(|error| {
                ErrorMapper::map(
                    "GetVerifiedAccountState",
                    &client_id,
                    &ErrorKind::Internal(InternalError(error.to_string())),
                )
            })?;

            Ok(Response::new(GetVerifiedAccountStateResponse {
                state,
                verified,
            }))
        }
        .await;

        observe(&self.service_name, "GetVerifiedAccountState", &client_id, result)
    }

    async fn stream_chain_events(
        &self,
        request: Request<StreamChainEventsRequest>,
    ) -> Result<Response<Self::StreamChainEventsStream>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let stream_request = StreamRequest {
            event_tag: domain::Tag::new(req.event_tag),
            sequence: non_empty(req.sequence),
            initial_position_in_stream: non_empty(req.initial_position_in_stream),
            sequence_num: Some(req.sequence_num),
            batch_size: req.batch_size,
        };

        let (domain_sender, mut domain_receiver) = mpsc::channel::<domain::EventEntry>(128);
        let (wire_sender, wire_receiver) = mpsc::channel::<Result<BlockchainEvent, Status>>(128);

        let streamer = self.streamer.clone();
        let shutdown = self.shutdown.clone();

        task::spawn({
            let client_id = client_id.clone();
            async move {
                let run_handle = task::spawn(async move {
                    streamer.run(stream_request, shutdown, &client_id, domain_sender).await
                });

                while let Some(event) = domain_receiver.recv().await {
                    if wire_sender.send(Ok(event_to_proto(event))).await.is_err() {
                        break;
                    }
                }
                // Drop eagerly so a client-initiated `break` above closes the streamer's sink
                // immediately rather than waiting for this task's scope to end.
                drop(domain_receiver);

                if let Ok(Err(error)) = run_handle.await {
                    let _ = wire_sender
                        .send(Err(ErrorMapper::map("StreamChainEvents", "stream", &error)))
                        .await;
                }
            }
        });

        let result = Ok(Response::new(ReceiverStream::new(wire_receiver)));
        observe(&self.service_name, "StreamChainEvents", &client_id, result)
    }

    async fn get_chain_events(
        &self,
        request: Request<GetChainEventsRequest>,
    ) -> Result<Response<GetChainEventsResponse>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let stream_request = StreamRequest {
            event_tag: domain::Tag::new(req.event_tag),
            sequence: non_empty(req.sequence),
            initial_position_in_stream: non_empty(req.initial_position_in_stream),
            sequence_num: Some(req.sequence_num),
            batch_size: req.batch_size,
        };

        let result = async {
            let events = self
                .streamer
                .pull(&stream_request)
                .await
                .map_err(|error| ErrorMapper::map("GetChainEvents", &client_id, &error))?;

            for event in &events {
                crate::metrics::events_served(event.event_type, &client_id, event.event_tag.get());
            }

            Ok(Response::new(GetChainEventsResponse {
                events: events.into_iter().map(event_to_proto).collect(),
            }))
        }
        .await;

        observe(&self.service_name, "GetChainEvents", &client_id, result)
    }

    async fn get_versioned_chain_event(
        &self,
        request: Request<GetVersionedChainEventRequest>,
    ) -> Result<Response<BlockchainEvent>, Status> {
        let client_id = client_id(&request);
        let req = request.into_inner();

        let result = async {
            let event = self
                .streamer
                .resolve_versioned(
                    domain::Tag::new(req.from_tag),
                    domain::Tag::new(req.to_tag),
                    req.from_sequence_num,
                )
                .await
                .map_err(|error| ErrorMapper::map("GetVersionedChainEvent", &client_id, &error))?;

            Ok(Response::new(event_to_proto(event)))
        }
        .await;

        observe(&self.service_name, "GetVersionedChainEvent", &client_id, result)
    }

    async fn get_chain_metadata(
        &self,
        request: Request<GetChainMetadataRequest>,
    ) -> Result<Response<GetChainMetadataResponse>, Status> {
        let client_id = client_id(&request);

        let result: Result<_, Status> = Ok(Response::new(GetChainMetadataResponse {
            latest_tag: self.index.latest_tag().await.get(),
            latest_event_tag: self.index.latest_event_tag().await.get(),
            event_id_start_value: 0,
        }));

        observe(&self.service_name, "GetChainMetadata", &client_id, result)
    }
}
