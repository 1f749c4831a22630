//! Rolling recent-event log for observability tooling.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use combat_core::CombatClock;

use super::bus::Event;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Monotonic sequence number, never reused after eviction.
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub round: u32,
    pub turn: u32,
    pub label: &'static str,
    pub event: Event,
}

/// Bounded log keeping the most recent `capacity` events.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    next_seq: u64,
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_seq: 0,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, event: &Event, clock: &CombatClock, at: DateTime<Utc>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            seq: self.next_seq,
            recorded_at: at,
            round: clock.round,
            turn: clock.turn,
            label: event.label(),
            event: event.clone(),
        });
        self.next_seq += 1;
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
