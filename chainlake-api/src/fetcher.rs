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

//! Concurrent payload download from the object store with bounded parallelism (§4.3, §5).

use chainlake_common::{
    domain::{BlockFile, BlockMetadata, Payload},
    error::{ErrorKind, InternalError},
    ports::ObjectStore,
};
use futures::{StreamExt, stream};

#[derive(Debug, Clone)]
pub struct PayloadFetcher<O> {
    store: O,
    num_workers: usize,
}

impl<O> PayloadFetcher<O>
where
    O: ObjectStore,
{
    pub fn new(store: O, num_workers: usize) -> Self {
        PayloadFetcher {
            store,
            num_workers: num_workers.max(1),
        }
    }

    /// Downloads a single block's payload. A `skipped` height has no object to fetch.
    pub async fn download_one(&self, meta: &BlockMetadata) -> Result<Payload, ErrorKind> {
        if meta.skipped {
            return Ok(Payload(Vec::new()));
        }

        self.store
            .download(&meta.object_key)
            .await
            .map(Payload)
            .map_err(|error| ErrorKind::Internal(InternalError(error.to_string())))
    }

    /// Downloads `metas` with at most `num_workers` downloads in flight. Result positions mirror
    /// the input order regardless of completion order. On the first error the whole batch fails
    /// with that error wrapped, and in-flight siblings are dropped (cooperative cancellation) —
    /// dropping the still-polling `buffer_unordered` stream cancels their futures.
    pub async fn download_many(&self, metas: &[BlockMetadata]) -> Result<Vec<Payload>, ErrorKind> {
        let mut slots: Vec<Option<Payload>> = (0..metas.len()).map(|_| None).collect();

        let mut downloads = stream::iter(metas.iter().cloned().enumerate())
            .map(|(index, meta)| {
                let store = self.store.clone();
                async move {
                    if meta.skipped {
                        return Ok((index, Payload(Vec::new())));
                    }
                    store
                        .download(&meta.object_key)
                        .await
                        .map(|bytes| (index, Payload(bytes)))
                }
            })
            .buffer_unordered(self.num_workers);

        while let Some(result) = downloads.next().await {
            match result {
                Ok((index, payload)) => slots[index] = Some(payload),
                Err(error) => {
                    // Dropping `downloads` here cancels every still-in-flight sibling download.
                    return Err(ErrorKind::Internal(InternalError(error.to_string())));
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|payload| payload.expect("every slot filled when no error occurred"))
            .collect())
    }

    /// Presigns `meta`'s payload URL, or returns the `skipped` sentinel (§4.3).
    pub fn presign_file(&self, meta: &BlockMetadata) -> BlockFile {
        if meta.skipped {
            return BlockFile::Skipped {
                tag: meta.tag,
                height: meta.height,
            };
        }

        BlockFile::Available {
            tag: meta.tag,
            hash: meta.hash,
            parent_hash: meta.parent_hash,
            height: meta.height,
            parent_height: meta.parent_height,
            file_url: self.store.presign(&meta.object_key),
            compression: meta.compression(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlake_common::{domain::BlockHash, domain::Tag, ports::InMemoryObjectStore};

    fn block(height: u64, object_key: &str, skipped: bool) -> BlockMetadata {
        BlockMetadata {
            tag: Tag::new(1),
            height,
            hash: BlockHash::from([height as u8; 32]),
            parent_hash: BlockHash::ZERO,
            parent_height: height.saturating_sub(1),
            timestamp: 0,
            skipped,
            object_key: object_key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_download_many_preserves_order_regardless_of_completion_order() {
        let store = InMemoryObjectStore::default();
        for i in 0..5u64 {
            store.insert(format!("o{i}"), vec![i as u8]);
        }

        let metas: Vec<_> = (0..5)
            .map(|i| block(i, &format!("o{i}"), false))
            .collect();

        let fetcher = PayloadFetcher::new(store, 4);
        let payloads = fetcher.download_many(&metas).await.unwrap();

        for (i, payload) in payloads.iter().enumerate() {
            assert_eq!(payload.0, vec![i as u8]);
        }
    }

    #[tokio::test]
    async fn test_download_many_fails_whole_batch_on_first_error() {
        let store = InMemoryObjectStore::default();
        for i in 0..5u64 {
            store.insert(format!("o{i}"), vec![i as u8]);
        }
        store.fail("o3");

        let metas: Vec<_> = (0..5)
            .map(|i| block(i, &format!("o{i}"), false))
            .collect();

        let fetcher = PayloadFetcher::new(store, 8);
        let result = fetcher.download_many(&metas).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_skipped_height_has_no_download_attempt() {
        let store = InMemoryObjectStore::default();
        let meta = block(7, "missing-object", true);

        let fetcher = PayloadFetcher::new(store, 1);
        let payload = fetcher.download_one(&meta).await.unwrap();

        assert!(payload.0.is_empty());
    }

    #[tokio::test]
    async fn test_presign_skipped_returns_sentinel() {
        let store = InMemoryObjectStore::default();
        let meta = block(7, "missing-object", true);

        let fetcher = PayloadFetcher::new(store, 1);
        let file = fetcher.presign_file(&meta);

        assert_eq!(file, BlockFile::Skipped { tag: Tag::new(1), height: 7 });
    }

    #[tokio::test]
    async fn test_presign_available_infers_compression() {
        let store = InMemoryObjectStore::default();
        let meta = block(7, "blocks/7.bin.zst", false);

        let fetcher = PayloadFetcher::new(store, 1);
        let file = fetcher.presign_file(&meta);

        match file {
            BlockFile::Available { compression, .. } => {
                assert_eq!(compression, chainlake_common::domain::Compression::Zstd)
            }
            BlockFile::Skipped { .. } => panic!("expected Available"),
        }
    }
}
