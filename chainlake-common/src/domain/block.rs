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

use crate::domain::{BlockHash, Tag};

/// Canonical-chain metadata for a single block, as published by upstream ingestion.
///
/// Immutable once published; a reorg produces a *new* `BlockMetadata` for a height rather than
/// mutating an existing one (see [`crate::domain::EventEntry`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMetadata {
    pub tag: Tag,
    pub height: u64,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub parent_height: u64,
    pub timestamp: i64,
    /// `true` if this height was reserved but produced no payload (no object to fetch).
    pub skipped: bool,
    /// Identifies the payload blob in the object store; compression is encoded in its suffix.
    pub object_key: String,
}

impl BlockMetadata {
    pub fn compression(&self) -> super::Compression {
        super::Compression::from_object_key(&self.object_key)
    }
}

/// A presigned reference to a block's payload file, or a sentinel for a skipped height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockFile {
    Skipped {
        tag: Tag,
        height: u64,
    },
    Available {
        tag: Tag,
        hash: BlockHash,
        parent_hash: BlockHash,
        height: u64,
        parent_height: u64,
        file_url: String,
        compression: super::Compression,
    },
}

/// A downloaded, not-yet-parsed block payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}
