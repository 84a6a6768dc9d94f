//! Per-connection counters
//!
//! Updated from both the receive loop and the keepalive task, so the
//! counters are atomics behind an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one connection
#[derive(Debug, Default)]
pub struct SessionStats {
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    events_dispatched: AtomicU64,
    parse_errors: AtomicU64,
    keepalives_sent: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Inbound frames (any service code)
    pub frames_received: u64,
    /// Inbound bytes
    pub bytes_received: u64,
    /// Domain events handed to the handler
    pub events_dispatched: u64,
    /// Frames that failed to parse
    pub parse_errors: u64,
    /// Keepalive frames written
    pub keepalives_sent: u64,
}

impl SessionStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&self, len: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_event(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_keepalive(&self) {
        self.keepalives_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            keepalives_sent: self.keepalives_sent.load(Ordering::Relaxed),
        }
    }
}
