//! Append-only, retention-bounded event log.
//!
//! The log keeps events in the order they were recorded. Once its length
//! exceeds twice the retention bound, the oldest entry is pruned, so the log
//! never holds more than `2 * retention` events. A retention of zero keeps
//! everything.

use std::collections::VecDeque;

use fable_types::{EntityId, Event, LocationId};

/// Default number of recent events considered "current".
pub const DEFAULT_RETENTION: usize = 15;

/// Ordered log of simulation events.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<Event>,
    retention: usize,
}

impl EventLog {
    /// Create an empty log with the given retention bound (0 = unlimited).
    pub const fn new(retention: usize) -> Self {
        Self {
            events: VecDeque::new(),
            retention,
        }
    }

    /// The configured retention bound.
    pub const fn retention(&self) -> usize {
        self.retention
    }

    /// The maximum number of events the log holds, if bounded.
    pub const fn capacity_bound(&self) -> Option<usize> {
        if self.retention == 0 {
            None
        } else {
            Some(self.retention.saturating_mul(2))
        }
    }

    /// Append an event, pruning the oldest entry once the bound is exceeded.
    pub fn log(&mut self, event: Event) {
        self.events.push_back(event);
        if let Some(bound) = self.capacity_bound() {
            while self.events.len() > bound {
                self.events.pop_front();
            }
        }
    }

    /// Iterate over retained events, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> {
        self.events.iter()
    }

    /// The most recent `count` events, oldest first.
    pub fn recent(&self, count: usize) -> Vec<&Event> {
        let skip = self.events.len().saturating_sub(count);
        self.events.iter().skip(skip).collect()
    }

    /// All retained events recorded at `step`.
    pub fn events_at_step(&self, step: u64) -> Vec<&Event> {
        self.events.iter().filter(|e| e.step == step).collect()
    }

    /// All retained events that happened at `location`.
    pub fn events_at(&self, location: &LocationId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.location.as_ref() == Some(location))
            .collect()
    }

    /// All retained events triggered by `entity`.
    pub fn events_by(&self, entity: &EntityId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| &e.triggered_by == entity)
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}
