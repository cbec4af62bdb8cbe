//! Shared application state.

use iras_relay_core::EventLog;
use tokio::sync::Mutex;

/// State shared across request handlers.
///
/// The event log is the single shared mutable resource; one lock serializes
/// append, recent, stats, and clear. Contention is low and every operation
/// is O(capacity) at worst.
pub(crate) struct AppState {
    pub(crate) log: Mutex<EventLog>,
}

impl AppState {
    pub(crate) fn new(log_capacity: usize) -> Self {
        AppState {
            log: Mutex::new(EventLog::new(log_capacity)),
        }
    }
}
