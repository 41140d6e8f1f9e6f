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

//! Long-lived event-log delivery with cursor resolution, adaptive idle backoff and cooperative
//! shutdown (§4.5) — the core of this crate.

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, backoff::Backoff};
use chainlake_common::{
    domain::{EventEntry, Tag},
    error::{ErrorKind, InternalError},
    ports::MetadataIndex,
};
use stream_cancel::Tripwire;
use std::time::Duration;
use tokio::sync::mpsc;

fn internal(error: impl std::error::Error) -> ErrorKind {
    ErrorKind::Internal(InternalError(error.to_string()))
}

/// The cursor fields a `StreamChainEvents`/`GetChainEvents` request carries (§6 cursor wire
/// format). Priority order when resolving a starting position is `sequence`, then
/// `initial_position_in_stream`, then `sequence_num` (§4.5).
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub event_tag: Tag,
    pub sequence: Option<String>,
    pub initial_position_in_stream: Option<String>,
    pub sequence_num: Option<i64>,
    pub batch_size: u32,
}

#[derive(Debug, Clone)]
pub struct EventStreamer<I> {
    index: I,
    interval: Duration,
    max_no_event_time: Duration,
}

impl<I> EventStreamer<I>
where
    I: MetadataIndex,
{
    pub fn new(index: I, interval: Duration, max_no_event_time: Duration) -> Self {
        EventStreamer {
            index,
            interval,
            max_no_event_time,
        }
    }

    /// Resolves `lastSentEventId` so the delivery loop can request "everything after" it (§4.5).
    ///
    /// On the documented collision (§9 open question) — `sequence` empty/absent *and*
    /// `initial_position_in_stream` empty/absent *and* `sequence_num` defaulting to `0` — this
    /// falls through to the `sequence_num` branch exactly as specified, which is
    /// indistinguishable from "no cursor supplied". That is the source system's own behavior and
    /// is documented here rather than special-cased away.
    pub async fn resolve_start_event_id(
        &self,
        event_tag: Tag,
        request: &StreamRequest,
    ) -> Result<i64, ErrorKind> {
        if let Some(sequence) = request.sequence.as_deref().filter(|s| !s.is_empty()) {
            return sequence
                .parse()
                .map_err(|_| ErrorKind::InvalidEventId(format!("invalid sequence {sequence:?}")));
        }

        if let Some(position) = request
            .initial_position_in_stream
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            return match position {
                "LATEST" => Ok(self
                    .index
                    .max_event_id(event_tag)
                    .await
                    .map_err(internal)?
                    .unwrap_or(-1)),

                "EARLIEST" => {
                    let earliest = self
                        .index
                        .earliest_event_id(event_tag)
                        .await
                        .map_err(internal)?
                        .ok_or_else(|| {
                            ErrorKind::NoEventHistory(format!(
                                "no event history for tag {event_tag:?}"
                            ))
                        })?;
                    Ok(earliest - 1)
                }

                height => {
                    let height: u64 = height.parse().map_err(|_| {
                        ErrorKind::InvalidEventId(format!(
                            "invalid initialPositionInStream {height:?}"
                        ))
                    })?;
                    let event_id = self
                        .index
                        .event_id_at_height(event_tag, height)
                        .await
                        .map_err(internal)?
                        .ok_or(ErrorKind::ItemNotFound)?;
                    Ok(event_id - 1)
                }
            };
        }

        Ok(request.sequence_num.unwrap_or(0))
    }

    fn new_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.interval)
            .with_multiplier(1.5)
            .with_max_interval(Duration::from_secs(60))
            .with_randomization_factor(0.5)
            .with_max_elapsed_time(Some(self.max_no_event_time))
            .build()
    }

    /// The long-lived delivery loop. Pushes events in strictly increasing `event_id` order into
    /// `sink` until the sink closes (client gone — clean `Ok(())`), `shutdown` fires (retryable
    /// `ShuttingDown`), or no event arrives for `max_no_event_time` (`IdleTimeout`).
    pub async fn run(
        &self,
        request: StreamRequest,
        mut shutdown: Tripwire,
        client_id: &str,
        sink: mpsc::Sender<EventEntry>,
    ) -> Result<(), ErrorKind> {
        let latest_event_tag = self.index.latest_event_tag().await;
        if request.event_tag > latest_event_tag {
            return Err(ErrorKind::OutOfRange(format!(
                "event tag {:?} exceeds latest event tag {latest_event_tag:?}",
                request.event_tag
            )));
        }

        let mut last_sent_event_id = self.resolve_start_event_id(request.event_tag, &request).await?;
        let batch_size = if request.batch_size == 0 {
            100
        } else {
            request.batch_size
        };

        let mut backoff = self.new_backoff();

        loop {
            let events = self
                .index
                .get_events(request.event_tag, last_sent_event_id, batch_size)
                .await
                .map_err(internal)?;

            if !events.is_empty() {
                backoff.reset();

                for event in events {
                    if sink.send(event.clone()).await.is_err() {
                        return Ok(());
                    }
                    last_sent_event_id = event.event_id;
                    crate::metrics::events_served(
                        event.event_type,
                        client_id,
                        request.event_tag.get(),
                    );
                }

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(10)) => {}
                    _ = &mut shutdown => return Err(ErrorKind::ShuttingDown),
                }
                continue;
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = &mut shutdown => return Err(ErrorKind::ShuttingDown),
                    }
                }
                None => return Err(ErrorKind::IdleTimeout),
            }
        }
    }

    /// Bounded pull equivalent of `run`: resolves the cursor and returns a single batch with no
    /// polling loop (`GetChainEvents`, §6).
    pub async fn pull(&self, request: &StreamRequest) -> Result<Vec<EventEntry>, ErrorKind> {
        let latest_event_tag = self.index.latest_event_tag().await;
        if request.event_tag > latest_event_tag {
            return Err(ErrorKind::OutOfRange(format!(
                "event tag {:?} exceeds latest event tag {latest_event_tag:?}",
                request.event_tag
            )));
        }

        let last_sent_event_id = self.resolve_start_event_id(request.event_tag, request).await?;
        let batch_size = if request.batch_size == 0 {
            100
        } else {
            request.batch_size
        };

        self.index
            .get_events(request.event_tag, last_sent_event_id, batch_size)
            .await
            .map_err(internal)
    }

    /// Re-resolves the event at `(from_tag, from_sequence_num)` in the `to_tag` namespace by
    /// `(blockHash, parentHash, eventType, blockSkipped, tag)`, breaking ties by the largest
    /// `event_id` (`GetVersionedChainEvent`, §6).
    pub async fn resolve_versioned(
        &self,
        from_tag: Tag,
        to_tag: Tag,
        from_sequence_num: i64,
    ) -> Result<EventEntry, ErrorKind> {
        let source = self
            .index
            .get_events(from_tag, from_sequence_num - 1, 1)
            .await
            .map_err(internal)?
            .into_iter()
            .next()
            .ok_or(ErrorKind::ItemNotFound)?;

        let key = source.resolution_key();

        let mut after_id = self
            .index
            .earliest_event_id(to_tag)
            .await
            .map_err(internal)?
            .map(|id| id - 1)
            .unwrap_or(-1);

        let mut best: Option<EventEntry> = None;
        const SCAN_BATCH: u32 = 1000;

        loop {
            let batch = self
                .index
                .get_events(to_tag, after_id, SCAN_BATCH)
                .await
                .map_err(internal)?;
            if batch.is_empty() {
                break;
            }

            after_id = batch.last().expect("non-empty").event_id;

            for candidate in batch {
                if candidate.resolution_key() == key
                    && best.as_ref().is_none_or(|b| candidate.event_id > b.event_id)
                {
                    best = Some(candidate);
                }
            }
        }

        best.ok_or(ErrorKind::ItemNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlake_common::{
        domain::{BlockHash, EventType},
        ports::InMemoryIndex,
    };
    use std::time::Duration;

    fn event(event_id: i64, height: u64) -> EventEntry {
        EventEntry {
            event_id,
            event_tag: Tag::new(1),
            event_type: EventType::BlockAdded,
            block_tag: Tag::new(1),
            block_height: height,
            block_hash: BlockHash::from([height as u8; 32]),
            parent_hash: BlockHash::ZERO,
            block_skipped: false,
            block_timestamp: 0,
        }
    }

    fn streamer(index: InMemoryIndex) -> EventStreamer<InMemoryIndex> {
        EventStreamer::new(index, Duration::from_millis(5), Duration::from_millis(200))
    }

    fn request(event_tag: Tag) -> StreamRequest {
        StreamRequest {
            event_tag,
            sequence: None,
            initial_position_in_stream: None,
            sequence_num: None,
            batch_size: 10,
        }
    }

    #[tokio::test]
    async fn test_earliest_cursor_starts_just_before_first_event() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.push_event(event(1, 100));
        index.push_event(event(2, 101));

        let streamer = streamer(index);
        let mut req = request(Tag::new(1));
        req.initial_position_in_stream = Some("EARLIEST".to_string());

        let start = streamer.resolve_start_event_id(Tag::new(1), &req).await.unwrap();
        assert_eq!(start, 0);
    }

    #[tokio::test]
    async fn test_latest_cursor_tails_from_now() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.push_event(event(1, 100));
        index.push_event(event(2, 101));

        let streamer = streamer(index);
        let mut req = request(Tag::new(1));
        req.initial_position_in_stream = Some("LATEST".to_string());

        let start = streamer.resolve_start_event_id(Tag::new(1), &req).await.unwrap();
        assert_eq!(start, 2);
    }

    #[tokio::test]
    async fn test_height_cursor_starts_before_first_event_at_that_height() {
        // S3: first event at height 250 has id 42; delivery starts from id 42.
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.push_event(event(41, 249));
        index.push_event(event(42, 250));
        index.push_event(event(43, 250));

        let streamer = streamer(index);
        let mut req = request(Tag::new(1));
        req.initial_position_in_stream = Some("250".to_string());

        let start = streamer.resolve_start_event_id(Tag::new(1), &req).await.unwrap();
        assert_eq!(start, 41);
    }

    #[tokio::test]
    async fn test_height_cursor_not_found() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let streamer = streamer(index);
        let mut req = request(Tag::new(1));
        req.initial_position_in_stream = Some("999".to_string());

        let error = streamer
            .resolve_start_event_id(Tag::new(1), &req)
            .await
            .unwrap_err();
        assert_eq!(error, ErrorKind::ItemNotFound);
    }

    #[tokio::test]
    async fn test_legacy_sequence_takes_priority_over_sequence_num() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let streamer = streamer(index);
        let req = StreamRequest {
            event_tag: Tag::new(1),
            sequence: Some("5".to_string()),
            initial_position_in_stream: None,
            sequence_num: Some(999),
            batch_size: 10,
        };

        let start = streamer.resolve_start_event_id(Tag::new(1), &req).await.unwrap();
        assert_eq!(start, 5);
    }

    #[tokio::test]
    async fn test_cursor_monotonicity_across_delivered_stream() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        for id in 0..5 {
            index.push_event(event(id, 100 + id as u64));
        }

        let streamer = streamer(index);
        let (sender, mut receiver) = mpsc::channel(16);
        let (_trigger, tripwire) = Tripwire::new();

        let handle = tokio::spawn(async move {
            streamer.run(request(Tag::new(1)), tripwire, "c1", sender).await
        });

        let mut received = Vec::new();
        while let Some(event) = receiver.recv().await {
            received.push(event.event_id);
            if received.len() == 5 {
                break;
            }
        }
        drop(receiver);
        let _ = handle.await;

        assert_eq!(received, vec![0, 1, 2, 3, 4]);
        assert!(received.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_client_gone_terminates_cleanly() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        index.push_event(event(0, 100));

        let streamer = streamer(index);
        let (sender, receiver) = mpsc::channel(1);
        let (_trigger, tripwire) = Tripwire::new();
        drop(receiver);

        let result = streamer.run(request(Tag::new(1)), tripwire, "c1", sender).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_idle_timeout_aborts_after_max_no_event_time() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let streamer = EventStreamer::new(
            index,
            Duration::from_millis(5),
            Duration::from_millis(50),
        );

        let (sender, _receiver) = mpsc::channel(1);
        let (_trigger, tripwire) = Tripwire::new();

        let result = streamer.run(request(Tag::new(1)), tripwire, "c1", sender).await;
        assert_eq!(result.unwrap_err(), ErrorKind::IdleTimeout);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_active_stream() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let streamer = streamer(index);

        let (sender, _receiver) = mpsc::channel(1);
        let (trigger, tripwire) = Tripwire::new();

        let handle =
            tokio::spawn(async move { streamer.run(request(Tag::new(1)), tripwire, "c1", sender).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(trigger);

        let result = handle.await.unwrap();
        assert_eq!(result.unwrap_err(), ErrorKind::ShuttingDown);
    }

    #[tokio::test]
    async fn test_rejects_event_tag_above_latest() {
        let index = InMemoryIndex::new(Tag::new(1), Tag::new(1));
        let streamer = streamer(index);

        let (sender, _receiver) = mpsc::channel(1);
        let (_trigger, tripwire) = Tripwire::new();

        let result = streamer
            .run(request(Tag::new(2)), tripwire, "c1", sender)
            .await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_resolve_versioned_breaks_ties_by_max_event_id() {
        let index = InMemoryIndex::new(Tag::new(2), Tag::new(2));
        let hash = BlockHash::from([7; 32]);
        let parent = BlockHash::ZERO;

        let source = EventEntry {
            event_id: 10,
            event_tag: Tag::new(1),
            event_type: EventType::BlockAdded,
            block_tag: Tag::new(1),
            block_height: 55,
            block_hash: hash,
            parent_hash: parent,
            block_skipped: false,
            block_timestamp: 0,
        };
        index.push_event(source.clone());

        let mut older_match = source.clone();
        older_match.event_id = 20;
        older_match.event_tag = Tag::new(2);
        index.push_event(older_match);

        let mut newer_match = source.clone();
        newer_match.event_id = 25;
        newer_match.event_tag = Tag::new(2);
        index.push_event(newer_match);

        let streamer = streamer(index);
        let resolved = streamer
            .resolve_versioned(Tag::new(1), Tag::new(2), 10)
            .await
            .unwrap();

        assert_eq!(resolved.event_id, 25);
    }
}
