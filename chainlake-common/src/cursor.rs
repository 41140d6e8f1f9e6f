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

//! Event-log cursor wire format (§6): the legacy `sequence` decimal string and the preferred
//! `sequenceNum` 64-bit integer must round-trip identically to the same `eventId`.

/// Encodes an `eventId` as the legacy decimal-string `sequence` value.
pub fn encode_sequence(event_id: i64) -> String {
    event_id.to_string()
}

/// Decodes a legacy decimal-string `sequence` value back to an `eventId`.
pub fn decode_sequence(sequence: &str) -> Result<i64, std::num::ParseIntError> {
    sequence.parse()
}

/// The preferred `sequenceNum` representation is already the 64-bit `eventId`; this alias
/// documents the wire-format equivalence rather than performing any conversion.
pub fn sequence_num(event_id: i64) -> i64 {
    event_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_cursors() {
        for event_id in [0i64, 1, 42, i64::MAX] {
            let sequence = encode_sequence(event_id);
            assert_eq!(decode_sequence(&sequence).unwrap(), event_id);
            assert_eq!(sequence_num(event_id), event_id);
        }
    }
}
