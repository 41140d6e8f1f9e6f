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

/// The kind of chain mutation an [`EventEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    BlockAdded,
    BlockRemoved,
}

/// A single entry in the monotonic event log.
///
/// `event_id` is strictly increasing within an `event_tag` namespace; a reorg materializes as a
/// `BlockRemoved` for the old tip(s) followed by a `BlockAdded` for the new tip(s), possibly at
/// the same height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub event_id: i64,
    pub event_tag: Tag,
    pub event_type: EventType,
    pub block_tag: Tag,
    pub block_height: u64,
    pub block_hash: BlockHash,
    pub parent_hash: BlockHash,
    pub block_skipped: bool,
    pub block_timestamp: i64,
}

impl EventEntry {
    /// The identity used to re-resolve this event across `eventTag` namespaces, per
    /// `GetVersionedChainEvent` (§6): `(blockHash, parentHash, eventType, blockSkipped, tag)`.
    pub fn resolution_key(&self) -> (BlockHash, BlockHash, EventType, bool, Tag) {
        (
            self.block_hash,
            self.parent_hash,
            self.event_type,
            self.block_skipped,
            self.block_tag,
        )
    }
}
