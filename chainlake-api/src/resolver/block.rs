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

//! Resolves block identifiers and height ranges against the metadata index (§4.2).

use crate::resolver::internal;
use chainlake_common::{
    domain::{BlockHash, BlockMetadata, Tag},
    error::ErrorKind,
    ports::MetadataIndex,
};

#[derive(Debug, Clone)]
pub struct BlockResolver<I> {
    index: I,
}

impl<I> BlockResolver<I>
where
    I: MetadataIndex,
{
    pub fn new(index: I) -> Self {
        BlockResolver { index }
    }

    pub async fn get_latest(&self, tag: Tag) -> Result<BlockMetadata, ErrorKind> {
        self.validate_tag(tag).await?;

        self.index
            .get_latest_block(tag)
            .await
            .map_err(internal)?
            .ok_or(ErrorKind::ItemNotFound)
    }

    pub async fn get_by_hash(
        &self,
        tag: Tag,
        height: u64,
        hash: BlockHash,
    ) -> Result<BlockMetadata, ErrorKind> {
        self.validate_tag(tag).await?;

        self.index
            .get_block_by_hash(tag, height, hash)
            .await
            .map_err(internal)?
            .ok_or(ErrorKind::ItemNotFound)
    }

    /// Resolves the canonical block at `height`, with no caller-known hash to check against
    /// (`GetVerifiedAccountState`, §6).
    pub async fn get_by_height(&self, tag: Tag, height: u64) -> Result<BlockMetadata, ErrorKind> {
        self.validate_tag(tag).await?;

        self.index
            .get_blocks_by_height_range(tag, height, height + 1)
            .await
            .map_err(internal)?
            .into_iter()
            .next()
            .ok_or(ErrorKind::ItemNotFound)
    }

    /// Fetches `[startHeight, endHeight)`, then re-reads the watermark to reject stale reads
    /// caused by a reorg that shortened the chain between the fetch and this check (§4.2).
    pub async fn get_range(
        &self,
        tag: Tag,
        start_height: u64,
        end_height: u64,
        max_blocks: u64,
    ) -> Result<Vec<BlockMetadata>, ErrorKind> {
        self.validate_tag(tag).await?;

        let end_height = if end_height == 0 {
            start_height + 1
        } else {
            end_height
        };

        if start_height >= end_height {
            return Err(ErrorKind::InvalidHeight(format!(
                "start height {start_height} must be less than end height {end_height}"
            )));
        }

        if end_height - start_height > max_blocks {
            return Err(ErrorKind::OutOfRange(format!(
                "range of {} blocks exceeds the maximum of {max_blocks}",
                end_height - start_height
            )));
        }

        let blocks = self
            .index
            .get_blocks_by_height_range(tag, start_height, end_height)
            .await
            .map_err(internal)?;

        let latest = self
            .index
            .get_latest_block(tag)
            .await
            .map_err(internal)?
            .ok_or(ErrorKind::ItemNotFound)?;

        if end_height - 1 > latest.height {
            return Err(ErrorKind::InvalidChain(format!(
                "block end height exceeded latest watermark {}",
                latest.height
            )));
        }

        Ok(blocks)
    }

    async fn validate_tag(&self, tag: Tag) -> Result<(), ErrorKind> {
        let latest_tag = self.index.latest_tag().await;
        if tag > latest_tag {
            return Err(ErrorKind::OutOfRange(format!(
                "tag {tag:?} exceeds the latest tag {latest_tag:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlake_common::{domain::BlockHash, ports::InMemoryIndex};

    fn block(tag: u32, height: u64, hash: u8) -> BlockMetadata {
        BlockMetadata {
            tag: Tag::new(tag),
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
    async fn test_get_latest_rejects_tag_above_latest() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let resolver = BlockResolver::new(index);

        let error = resolver.get_latest(Tag::new(2)).await.unwrap_err();
        assert_eq!(error.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_by_height_resolves_canonical_block() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.insert_block(block(1, 100, 7));

        let resolver = BlockResolver::new(index);
        let meta = resolver.get_by_height(Tag::new(1), 100).await.unwrap();

        assert_eq!(meta.height, 100);
        assert_eq!(meta.hash, BlockHash::from([7; 32]));
    }

    #[tokio::test]
    async fn test_get_by_height_not_found() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let resolver = BlockResolver::new(index);

        let error = resolver.get_by_height(Tag::new(1), 100).await.unwrap_err();
        assert_eq!(error, ErrorKind::ItemNotFound);
    }

    #[tokio::test]
    async fn test_get_latest_not_found_when_empty() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let resolver = BlockResolver::new(index);

        let error = resolver.get_latest(Tag::new(1)).await.unwrap_err();
        assert_eq!(error, ErrorKind::ItemNotFound);
    }

    #[tokio::test]
    async fn test_get_range_rejects_reorg_shortened_chain() {
        // Fixture from §8 property 2: range read returns [100, 110) but the watermark re-check
        // reports height 108.
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        for height in 100..110 {
            index.insert_block(block(1, height, height as u8));
        }
        index.set_latest_height(Tag::new(1), 108);

        let resolver = BlockResolver::new(index);
        let error = resolver
            .get_range(Tag::new(1), 100, 110, 1000)
            .await
            .unwrap_err();

        assert_eq!(error.code(), tonic::Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn test_get_range_end_height_zero_is_start_plus_one() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.insert_block(block(1, 100, 1));
        index.set_latest_height(Tag::new(1), 100);

        let resolver = BlockResolver::new(index);
        let blocks = resolver.get_range(Tag::new(1), 100, 0, 10).await.unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].height, 100);
    }

    #[tokio::test]
    async fn test_get_range_rejects_exceeding_max_blocks() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.set_latest_height(Tag::new(1), 1000);

        let resolver = BlockResolver::new(index);
        let error = resolver
            .get_range(Tag::new(1), 0, 200, 100)
            .await
            .unwrap_err();

        assert_eq!(error.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_range_ascending_order_regardless_of_insertion_order() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.insert_block(block(1, 101, 2));
        index.insert_block(block(1, 100, 1));
        index.set_latest_height(Tag::new(1), 101);

        let resolver = BlockResolver::new(index);
        let blocks = resolver.get_range(Tag::new(1), 100, 102, 10).await.unwrap();

        assert_eq!(blocks[0].height, 100);
        assert_eq!(blocks[1].height, 101);
    }
}
