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

//! Trait boundaries toward the systems §1 declares out of scope: the metadata index and the
//! payload object store. Production adapters for these are upstream ingestion's concern; this
//! module only defines the seam plus an in-memory fake of each, in the same spirit as the
//! teacher's `NoopStorage`.

mod fakes;

pub use fakes::{
    InMemoryIndex, InMemoryObjectStore, InMemoryParser, InMemoryProofSource, InMemoryProofValidator,
};

use crate::domain::{BlockHash, BlockMetadata, EventEntry, Tag, TransactionHash, TransactionRecord};
use std::fmt::Debug;

/// Read access to the canonical-chain metadata index and its event log.
#[trait_variant::make(Send)]
pub trait MetadataIndex
where
    Self: Debug + Clone + Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    async fn latest_tag(&self) -> Tag;

    async fn latest_event_tag(&self) -> Tag;

    async fn get_latest_block(&self, tag: Tag) -> Result<Option<BlockMetadata>, Self::Error>;

    async fn get_block_by_hash(
        &self,
        tag: Tag,
        height: u64,
        hash: BlockHash,
    ) -> Result<Option<BlockMetadata>, Self::Error>;

    /// Returns metadata for `[start_height, end_height)` ascending by height. Implementations
    /// need not validate the range; `BlockResolver` performs the watermark re-check (§4.2).
    async fn get_blocks_by_height_range(
        &self,
        tag: Tag,
        start_height: u64,
        end_height: u64,
    ) -> Result<Vec<BlockMetadata>, Self::Error>;

    async fn get_transaction_records(
        &self,
        tag: Tag,
        transaction_hash: TransactionHash,
    ) -> Result<Vec<TransactionRecord>, Self::Error>;

    /// Events for `event_tag` with `event_id > after_id`, ordered by id, at most `limit`.
    async fn get_events(
        &self,
        event_tag: Tag,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<EventEntry>, Self::Error>;

    /// The smallest `event_id` present for `event_tag`, or `None` if the log is empty or has
    /// been fully compacted (`ErrNoEventHistory`).
    async fn earliest_event_id(&self, event_tag: Tag) -> Result<Option<i64>, Self::Error>;

    /// The largest `event_id` present for `event_tag`.
    async fn max_event_id(&self, event_tag: Tag) -> Result<Option<i64>, Self::Error>;

    /// The id of the first event whose `block_height == height`, for `"initialPositionInStream"`
    /// height-cursor resolution (§4.5).
    async fn event_id_at_height(
        &self,
        event_tag: Tag,
        height: u64,
    ) -> Result<Option<i64>, Self::Error>;
}

/// Read access to the large-object payload store.
#[trait_variant::make(Send)]
pub trait ObjectStore
where
    Self: Debug + Clone + Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    async fn download(&self, object_key: &str) -> Result<Vec<u8>, Self::Error>;

    /// Returns a presigned, time-limited URL for `object_key`.
    fn presign(&self, object_key: &str) -> String;
}

/// Blockchain-specific payload parser backing `GetNativeBlock`/`GetRosettaBlock` (§6); out of
/// scope per §1 ("blockchain-specific parsers"), modeled here only as the seam the serving core
/// calls through.
#[trait_variant::make(Send)]
pub trait Parser
where
    Self: Debug + Clone + Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    async fn parse_native(&self, payload: &[u8]) -> Result<Vec<u8>, Self::Error>;

    async fn parse_rosetta(&self, payload: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// External proof source for `GetVerifiedAccountState` (§6); out of scope beyond this seam.
#[trait_variant::make(Send)]
pub trait ProofSource
where
    Self: Debug + Clone + Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_proof(&self, account: &str, height: u64) -> Result<Vec<u8>, Self::Error>;
}

/// External proof validator for `GetVerifiedAccountState` (§6); out of scope beyond this seam.
#[trait_variant::make(Send)]
pub trait ProofValidator
where
    Self: Debug + Clone + Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    async fn validate(&self, proof: &[u8], state: &[u8]) -> Result<bool, Self::Error>;
}
