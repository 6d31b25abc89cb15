//! Gameplay telemetry
//!
//! The engine emits one event per spawn and one per resolution. Delivery is the
//! sink's problem: [`TelemetryQueue`] buffers events and flushes them in batches
//! through a caller-supplied transport, putting a failed batch back in front.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{Direction, FailReason, PatternType};

/// Delivery failure reported by a transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telemetry transport failed: {0}")]
    Failed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PatternSpawn,
    PatternSuccess,
    PatternFail,
}

/// One structured telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event_name: EventName,
    /// Engine time (ms)
    pub event_time: u64,
    pub session_id: String,
    pub game_index: u32,
    pub pattern_type: PatternType,
    pub direction: Direction,
    pub sequence_order: u64,
    pub delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<FailReason>,
    pub score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_speed: Option<f32>,
}

/// Receiver of telemetry events
pub trait TelemetrySink {
    fn record(&mut self, event: TelemetryEvent);
}

impl TelemetrySink for Vec<TelemetryEvent> {
    fn record(&mut self, event: TelemetryEvent) {
        self.push(event);
    }
}

/// Default cap on buffered events
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// In-memory batching sink
#[derive(Debug)]
pub struct TelemetryQueue {
    pending: VecDeque<TelemetryEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for TelemetryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl TelemetryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn pending(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.pending.iter()
    }

    /// Send everything buffered as one batch.
    ///
    /// On failure the batch goes back to the front of the queue, ahead of any
    /// events recorded since, and the error is returned for the caller to log.
    pub fn flush<F>(&mut self, mut send: F) -> Result<usize, TransportError>
    where
        F: FnMut(&[TelemetryEvent]) -> Result<(), TransportError>,
    {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let batch: Vec<TelemetryEvent> = self.pending.drain(..).collect();
        match send(&batch) {
            Ok(()) => {
                log::debug!("Flushed {} telemetry events", batch.len());
                Ok(batch.len())
            }
            Err(e) => {
                log::warn!("Telemetry flush failed, requeueing {} events: {}", batch.len(), e);
                for event in batch.into_iter().rev() {
                    self.pending.push_front(event);
                }
                self.trim();
                Err(e)
            }
        }
    }

    fn trim(&mut self) {
        while self.pending.len() > self.capacity {
            self.pending.pop_front();
            self.dropped += 1;
        }
    }
}

impl TelemetrySink for TelemetryQueue {
    fn record(&mut self, event: TelemetryEvent) {
        self.pending.push_back(event);
        if self.pending.len() > self.capacity {
            log::warn!("Telemetry queue full, dropping oldest event");
            self.trim();
        }
    }
}

/// Serialize a batch as a JSON array
pub fn batch_to_json(batch: &[TelemetryEvent]) -> Result<String, TransportError> {
    Ok(serde_json::to_string(batch)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(order: u64) -> TelemetryEvent {
        TelemetryEvent {
            event_name: EventName::PatternSpawn,
            event_time: order * 10,
            session_id: "s-1".to_string(),
            game_index: 1,
            pattern_type: PatternType::Parry,
            direction: Direction::Left,
            sequence_order: order,
            delay_ms: 150,
            reaction_time_ms: None,
            fail_reason: None,
            score: 0,
            star_speed: None,
        }
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(event(1)).unwrap();
        assert_eq!(json["event_name"], "pattern_spawn");
        assert_eq!(json["pattern_type"], "parry");
        assert_eq!(json["direction"], "LEFT");
        assert!(json.get("reaction_time_ms").is_none());
        assert!(json.get("fail_reason").is_none());
    }

    #[test]
    fn test_fail_event_carries_reason() {
        let mut e = event(2);
        e.event_name = EventName::PatternFail;
        e.fail_reason = Some(FailReason::FakeTricked);
        e.reaction_time_ms = Some(230);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["fail_reason"], "fake_tricked");
        assert_eq!(json["reaction_time_ms"], 230);
    }

    #[test]
    fn test_flush_success_empties_queue() {
        let mut queue = TelemetryQueue::default();
        queue.record(event(1));
        queue.record(event(2));
        let mut sent = Vec::new();
        let n = queue
            .flush(|batch| {
                sent.extend_from_slice(batch);
                Ok(())
            })
            .unwrap();
        assert_eq!(n, 2);
        assert!(queue.is_empty());
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn test_flush_failure_requeues_in_order() {
        let mut queue = TelemetryQueue::default();
        queue.record(event(1));
        queue.record(event(2));
        let result = queue.flush(|_| Err(TransportError::Failed("offline".into())));
        assert!(result.is_err());

        queue.record(event(3));
        let orders: Vec<_> = queue.pending().map(|e| e.sequence_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut queue = TelemetryQueue::new(2);
        for i in 1..=3 {
            queue.record(event(i));
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.pending().next().map(|e| e.sequence_order), Some(2));
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut queue = TelemetryQueue::default();
        let mut called = false;
        assert_eq!(
            queue
                .flush(|_| {
                    called = true;
                    Ok(())
                })
                .unwrap(),
            0
        );
        assert!(!called);
    }

    #[test]
    fn test_batch_json_is_array() {
        let json = batch_to_json(&[event(1), event(2)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
    }
}
