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

//! In-memory fakes of the [`super::MetadataIndex`] and [`super::ObjectStore`] ports, used by
//! this workspace's own test suite. Not a production adapter.

use crate::domain::{BlockHash, BlockMetadata, EventEntry, Tag, TransactionHash, TransactionRecord};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("in-memory fake error: {0}")]
pub struct FakeError(pub String);

#[derive(Debug, Clone, Default)]
struct IndexState {
    blocks: HashMap<(u32, u64), BlockMetadata>,
    /// The watermark `GetLatestBlock` reports, independent of what `blocks` happens to contain
    /// — lets tests model a reorg shortening the chain between a range read and the re-check.
    latest_height: HashMap<u32, u64>,
    events: HashMap<u32, Vec<EventEntry>>,
    transaction_records: HashMap<(u32, [u8; 32]), Vec<TransactionRecord>>,
}

/// An in-memory [`super::MetadataIndex`] fake, seeded and mutated directly by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<RwLock<IndexState>>,
    latest_tag: Tag,
    latest_event_tag: Tag,
}

impl InMemoryIndex {
    pub fn new(latest_tag: Tag, latest_event_tag: Tag) -> Self {
        InMemoryIndex {
            state: Arc::default(),
            latest_tag,
            latest_event_tag,
        }
    }

    pub fn insert_block(&self, block: BlockMetadata) {
        let mut state = self.state.write().expect("lock not poisoned");
        let tag = block.tag.get();
        let height = block.height;
        state
            .latest_height
            .entry(tag)
            .and_modify(|h| *h = (*h).max(height))
            .or_insert(height);
        state.blocks.insert((tag, height), block);
    }

    /// Forces the reported watermark for `tag`, independent of the blocks currently stored.
    pub fn set_latest_height(&self, tag: Tag, height: u64) {
        self.state
            .write()
            .expect("lock not poisoned")
            .latest_height
            .insert(tag.get(), height);
    }

    pub fn push_event(&self, event: EventEntry) {
        self.state
            .write()
            .expect("lock not poisoned")
            .events
            .entry(event.event_tag.get())
            .or_default()
            .push(event);
    }

    pub fn insert_transaction_record(&self, record: TransactionRecord) {
        self.state
            .write()
            .expect("lock not poisoned")
            .transaction_records
            .entry((record.tag.get(), *record.transaction_hash.as_bytes()))
            .or_default()
            .push(record);
    }
}

impl super::MetadataIndex for InMemoryIndex {
    type Error = FakeError;

    async fn latest_tag(&self) -> Tag {
        self.latest_tag
    }

    async fn latest_event_tag(&self) -> Tag {
        self.latest_event_tag
    }

    async fn get_latest_block(&self, tag: Tag) -> Result<Option<BlockMetadata>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        let Some(&height) = state.latest_height.get(&tag.get()) else {
            return Ok(None);
        };
        Ok(state.blocks.get(&(tag.get(), height)).cloned())
    }

    async fn get_block_by_hash(
        &self,
        tag: Tag,
        height: u64,
        hash: BlockHash,
    ) -> Result<Option<BlockMetadata>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok(state
            .blocks
            .get(&(tag.get(), height))
            .filter(|b| b.hash == hash)
            .cloned())
    }

    async fn get_blocks_by_height_range(
        &self,
        tag: Tag,
        start_height: u64,
        end_height: u64,
    ) -> Result<Vec<BlockMetadata>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok((start_height..end_height)
            .filter_map(|height| state.blocks.get(&(tag.get(), height)).cloned())
            .collect())
    }

    async fn get_transaction_records(
        &self,
        tag: Tag,
        transaction_hash: TransactionHash,
    ) -> Result<Vec<TransactionRecord>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok(state
            .transaction_records
            .get(&(tag.get(), *transaction_hash.as_bytes()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_events(
        &self,
        event_tag: Tag,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<EventEntry>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        let events = state.events.get(&event_tag.get()).cloned().unwrap_or_default();
        Ok(events
            .into_iter()
            .filter(|e| e.event_id > after_id)
            .take(limit as usize)
            .collect())
    }

    async fn earliest_event_id(&self, event_tag: Tag) -> Result<Option<i64>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok(state
            .events
            .get(&event_tag.get())
            .and_then(|events| events.iter().map(|e| e.event_id).min()))
    }

    async fn max_event_id(&self, event_tag: Tag) -> Result<Option<i64>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok(state
            .events
            .get(&event_tag.get())
            .and_then(|events| events.iter().map(|e| e.event_id).max()))
    }

    async fn event_id_at_height(
        &self,
        event_tag: Tag,
        height: u64,
    ) -> Result<Option<i64>, Self::Error> {
        let state = self.state.read().expect("lock not poisoned");
        Ok(state.events.get(&event_tag.get()).and_then(|events| {
            events
                .iter()
                .find(|e| e.block_height == height)
                .map(|e| e.event_id)
        }))
    }
}

/// An in-memory [`super::ObjectStore`] fake backed by a map from object key to payload bytes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Object keys that should fail the next download, to exercise `DownloadMany` cancellation.
    failing_keys: Arc<RwLock<std::collections::HashSet<String>>>,
}

impl InMemoryObjectStore {
    pub fn insert(&self, object_key: impl Into<String>, payload: Vec<u8>) {
        self.objects
            .write()
            .expect("lock not poisoned")
            .insert(object_key.into(), payload);
    }

    pub fn fail(&self, object_key: impl Into<String>) {
        self.failing_keys
            .write()
            .expect("lock not poisoned")
            .insert(object_key.into());
    }
}

impl super::ObjectStore for InMemoryObjectStore {
    type Error = FakeError;

    async fn download(&self, object_key: &str) -> Result<Vec<u8>, Self::Error> {
        if self
            .failing_keys
            .read()
            .expect("lock not poisoned")
            .contains(object_key)
        {
            return Err(FakeError(format!("download failed for {object_key}")));
        }

        self.objects
            .read()
            .expect("lock not poisoned")
            .get(object_key)
            .cloned()
            .ok_or_else(|| FakeError(format!("no such object: {object_key}")))
    }

    fn presign(&self, object_key: &str) -> String {
        format!("https://objects.example/{object_key}?sig=fake")
    }
}

/// Echoes the raw payload back unchanged for both formats; rejects empty payloads so tests can
/// exercise the `InvalidParserInput` path without a real blockchain-specific parser.
#[derive(Debug, Clone, Default)]
pub struct InMemoryParser;

impl super::Parser for InMemoryParser {
    type Error = FakeError;

    async fn parse_native(&self, payload: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if payload.is_empty() {
            return Err(FakeError("empty payload".to_string()));
        }
        Ok(payload.to_vec())
    }

    async fn parse_rosetta(&self, payload: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if payload.is_empty() {
            return Err(FakeError("empty payload".to_string()));
        }
        Ok(payload.to_vec())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProofSource;

impl super::ProofSource for InMemoryProofSource {
    type Error = FakeError;

    async fn fetch_proof(&self, _account: &str, _height: u64) -> Result<Vec<u8>, Self::Error> {
        Ok(vec![0u8; 32])
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProofValidator;

impl super::ProofValidator for InMemoryProofValidator {
    type Error = FakeError;

    async fn validate(&self, _proof: &[u8], _state: &[u8]) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
