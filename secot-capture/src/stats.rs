//! Capture statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the passive capture counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureCounters {
    /// Frames seen by the capture callback, filtered or not
    pub total_packets: u64,
    pub beacon_count: u64,
    pub probe_req_count: u64,
    pub probe_resp_count: u64,
    pub deauth_count: u64,
    pub data_count: u64,
    /// Records dropped because the capture queue was full
    pub queue_overflows: u64,
    pub device_count: usize,
    pub ap_count: usize,
}

impl CaptureCounters {
    /// Format counters as a one-line summary
    pub fn format(&self) -> String {
        format!(
            "{} packets ({} beacons, {} probe requests, {} probe responses, {} deauths, {} data), \
             {} devices ({} APs), {} dropped",
            self.total_packets,
            self.beacon_count,
            self.probe_req_count,
            self.probe_resp_count,
            self.deauth_count,
            self.data_count,
            self.device_count,
            self.ap_count,
            self.queue_overflows
        )
    }
}

/// Thread-safe counters updated from the capture callback
#[derive(Debug, Default)]
pub struct TapCounters {
    received: AtomicU64,
    overflows: AtomicU64,
}

impl TapCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame delivered by the radio
    pub fn record_frame(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record lost to a full queue
    pub fn record_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.overflows.store(0, Ordering::Relaxed);
    }
}

/// Per-class counters, updated on the main loop as records are ingested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounters {
    pub beacons: u64,
    pub probe_requests: u64,
    pub probe_responses: u64,
    pub deauths: u64,
    pub data: u64,
}
