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

mod block;
mod tx;

pub use block::BlockResolver;
pub use tx::TxResolver;

use chainlake_common::error::{ErrorKind, InternalError};
use std::error::Error as StdError;

/// Wraps a collaborator error (index, object store, ...) as an opaque `INTERNAL` failure.
fn internal(error: impl StdError) -> ErrorKind {
    ErrorKind::Internal(InternalError(error.to_string()))
}
