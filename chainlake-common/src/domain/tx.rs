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

use crate::domain::{BlockHash, Tag, TransactionHash};

/// An index entry mapping a transaction hash to a block it was included in.
///
/// Multiple records may exist for one hash across historical reorgs; canonicality is decided by
/// cross-checking `block_hash` against the current [`crate::domain::BlockMetadata`] at
/// `block_height` (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub tag: Tag,
    pub transaction_hash: TransactionHash,
    pub block_height: u64,
    pub block_hash: BlockHash,
}
