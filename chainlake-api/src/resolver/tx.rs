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

//! Resolves a transaction hash to the canonical block(s) that contain it, filtering out
//! inclusions a reorg has since invalidated (§4.4).

use crate::resolver::internal;
use chainlake_common::{
    domain::{BlockMetadata, Tag, TransactionHash},
    error::ErrorKind,
    ports::MetadataIndex,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TxResolver<I> {
    index: I,
}

impl<I> TxResolver<I>
where
    I: MetadataIndex,
{
    pub fn new(index: I) -> Self {
        TxResolver { index }
    }

    /// 1. Fetches every transaction record for `(tag, tx_hash)`.
    /// 2. Dedups heights for the batch fetch.
    /// 3. Batch-fetches canonical `BlockMetadata` covering those heights.
    /// 4. Keeps each *original* record iff its `block_hash` still matches the canonical block at
    ///    that height — anything else was reorged out.
    /// 5. Returns results in the original records' order.
    pub async fn resolve_blocks(
        &self,
        tag: Tag,
        tx_hash: TransactionHash,
    ) -> Result<Vec<BlockMetadata>, ErrorKind> {
        let records = self
            .index
            .get_transaction_records(tag, tx_hash)
            .await
            .map_err(internal)?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut heights: Vec<u64> = records.iter().map(|record| record.block_height).collect();
        heights.sort_unstable();
        heights.dedup();

        let min_height = *heights.first().expect("non-empty");
        let max_height = *heights.last().expect("non-empty");

        let canonical_blocks = self
            .index
            .get_blocks_by_height_range(tag, min_height, max_height + 1)
            .await
            .map_err(internal)?;

        let canonical_by_height: HashMap<u64, BlockMetadata> = canonical_blocks
            .into_iter()
            .map(|block| (block.height, block))
            .collect();

        let resolved = records
            .into_iter()
            .filter_map(|record| {
                canonical_by_height
                    .get(&record.block_height)
                    .filter(|canonical| canonical.hash == record.block_hash)
                    .cloned()
            })
            .collect();

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlake_common::{
        domain::{BlockHash, TransactionRecord},
        ports::InMemoryIndex,
    };

    fn block(height: u64, hash: u8) -> BlockMetadata {
        BlockMetadata {
            tag: Tag::new(1),
            height,
            hash: BlockHash::from([hash; 32]),
            parent_hash: BlockHash::ZERO,
            parent_height: height.saturating_sub(1),
            timestamp: 0,
            skipped: false,
            object_key: format!("blocks/{height}.bin"),
        }
    }

    #[tokio::test]
    async fn test_reorg_filter_keeps_only_canonical_record() {
        // §8 property 6 / S4: two records at height 10 with hashes A and B; canonical is B.
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.insert_block(block(10, 0xB));

        let tx_hash = TransactionHash::from([0xDE; 32]);
        index.insert_transaction_record(TransactionRecord {
            tag: Tag::new(1),
            transaction_hash: tx_hash,
            block_height: 10,
            block_hash: BlockHash::from([0xA; 32]),
        });
        index.insert_transaction_record(TransactionRecord {
            tag: Tag::new(1),
            transaction_hash: tx_hash,
            block_height: 10,
            block_hash: BlockHash::from([0xB; 32]),
        });

        let resolver = TxResolver::new(index);
        let blocks = resolver.resolve_blocks(Tag::new(1), tx_hash).await.unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].hash, BlockHash::from([0xB; 32]));
    }

    #[tokio::test]
    async fn test_no_records_returns_empty() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let resolver = TxResolver::new(index);

        let blocks = resolver
            .resolve_blocks(Tag::new(1), TransactionHash::from([0; 32]))
            .await
            .unwrap();

        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn test_preserves_original_record_order_across_heights() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.insert_block(block(10, 1));
        index.insert_block(block(20, 2));

        let tx_hash = TransactionHash::from([0xAB; 32]);
        index.insert_transaction_record(TransactionRecord {
            tag: Tag::new(1),
            transaction_hash: tx_hash,
            block_height: 20,
            block_hash: BlockHash::from([2; 32]),
        });
        index.insert_transaction_record(TransactionRecord {
            tag: Tag::new(1),
            transaction_hash: tx_hash,
            block_height: 10,
            block_hash: BlockHash::from([1; 32]),
        });

        let resolver = TxResolver::new(index);
        let blocks = resolver.resolve_blocks(Tag::new(1), tx_hash).await.unwrap();

        assert_eq!(blocks[0].height, 20);
        assert_eq!(blocks[1].height, 10);
    }
}
