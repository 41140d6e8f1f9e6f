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

use derive_more::{Display, From, Into};

/// A schema/version generation for block or event data. Requests must name a tag that is no
/// newer than the server's declared latest tag for the relevant namespace (§4.2, §4.5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct Tag(u32);

impl Tag {
    pub const fn new(tag: u32) -> Self {
        Tag(tag)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Compression scheme a payload's object key indicates, inferred from the key's file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Infers the compression of a payload from its object key suffix.
    ///
    /// The exact suffix convention is not specified by the wire format; `.gz`/`.zst` are the
    /// two schemes upstream ingestion is known to produce.
    pub fn from_object_key(object_key: &str) -> Self {
        if object_key.ends_with(".gz") {
            Compression::Gzip
        } else if object_key.ends_with(".zst") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ordering() {
        assert!(Tag::new(1) < Tag::new(2));
    }

    #[test]
    fn test_compression_from_suffix() {
        assert_eq!(
            Compression::from_object_key("blocks/100.bin.gz"),
            Compression::Gzip
        );
        assert_eq!(
            Compression::from_object_key("blocks/100.bin.zst"),
            Compression::Zstd
        );
        assert_eq!(
            Compression::from_object_key("blocks/100.bin"),
            Compression::None
        );
    }
}
