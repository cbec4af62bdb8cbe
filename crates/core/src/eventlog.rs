//! Bounded in-memory event log for callback diagnostics.
//!
//! A fixed-capacity, insertion-ordered history of handled requests.
//! Process-lifetime only; losing it on restart is accepted, not a defect.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::Serialize;

/// Default retained-entry capacity.
pub const DEFAULT_CAPACITY: usize = 200;

/// Outcome of the logged transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Success,
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Success => "SUCCESS",
            EntryStatus::Error => "ERROR",
        }
    }
}

/// One observed HTTP transaction. Created once per handled request and never
/// mutated; destroyed only by eviction or [`EventLog::clear`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// 8-character opaque correlation token, generated per request.
    pub request_id: String,
    /// ISO-8601 generation time.
    pub timestamp: String,
    /// Endpoint tag, e.g. "GST-RETURN".
    pub endpoint: String,
    /// Raw decoded submission body, kept for audit (not re-validated).
    pub payload: serde_json::Value,
    /// Subset of request headers deemed safe to retain.
    pub headers: BTreeMap<String, String>,
    pub client_address: String,
    pub method: String,
    pub status: EntryStatus,
}

/// Aggregate counts over the currently retained entries.
///
/// Computed from the buffer alone, so evicted entries are never counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub by_endpoint: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub oldest_timestamp: Option<String>,
    pub newest_timestamp: Option<String>,
}

/// Append-only, capacity-bounded store of recent [`LogEntry`] values.
///
/// Eviction is strictly oldest-first. Readers receive copies; no component
/// holds a reference into the middle of the sequence.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        EventLog {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
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

    /// Append an entry, evicting from the front while over capacity.
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The most recent `limit` entries in chronological order (newest LAST).
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Aggregate counts over the retained entries.
    pub fn stats(&self) -> LogStats {
        let mut by_endpoint: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &self.entries {
            *by_endpoint.entry(entry.endpoint.clone()).or_default() += 1;
            *by_status.entry(entry.status.as_str().to_string()).or_default() += 1;
        }
        LogStats {
            total: self.entries.len(),
            by_endpoint,
            by_status,
            oldest_timestamp: self.entries.front().map(|e| e.timestamp.clone()),
            newest_timestamp: self.entries.back().map(|e| e.timestamp.clone()),
        }
    }

    /// Empty the log. Irreversible; returns the number of entries dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}

impl Default for EventLog {
    fn default() -> Self {
        EventLog::new(DEFAULT_CAPACITY)
    }
}
