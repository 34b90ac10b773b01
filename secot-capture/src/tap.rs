//! Capture callback side
//!
//! The radio calls [`CaptureTap::on_frame`] from its own context. The tap
//! only classifies the frame and hands a small record to the main loop
//! through a bounded queue; it never touches the device table or the
//! packet ring.

use secot_core::{FrameSink, MacAddr, RxMeta};
use secot_packet::ieee80211::subtype;
use secot_packet::{beacon_ssid, FrameKind, MacHeader};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;
use tracing::trace;

use crate::filters::CaptureSwitches;
use crate::stats::TapCounters;

/// A classified frame on its way to the main loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub kind: FrameKind,
    /// Receiver address
    pub addr1: Option<MacAddr>,
    /// Transmitter address
    pub addr2: Option<MacAddr>,
    /// Network name, beacons only
    pub ssid: Option<String>,
    pub rssi: i8,
    pub channel: u8,
    pub len: usize,
    pub at: Instant,
}

/// [`FrameSink`] feeding the passive capture queue
pub struct CaptureTap {
    switches: Arc<CaptureSwitches>,
    counters: Arc<TapCounters>,
    queue: mpsc::Sender<CapturedFrame>,
}

impl CaptureTap {
    /// Create a tap and the receiving end of its queue
    pub fn channel(
        switches: Arc<CaptureSwitches>,
        counters: Arc<TapCounters>,
        depth: usize,
    ) -> (Arc<Self>, mpsc::Receiver<CapturedFrame>) {
        let (queue, rx) = mpsc::channel(depth);
        let tap = Arc::new(Self {
            switches,
            counters,
            queue,
        });
        (tap, rx)
    }

    /// Decode and filter one frame, `None` if it is not kept
    pub fn classify(&self, frame: &[u8], meta: RxMeta) -> Option<CapturedFrame> {
        let header = MacHeader::parse(frame).ok()?;
        if !self.switches.accepts(header.kind) {
            return None;
        }

        let ssid = if header.kind.is_management(subtype::BEACON) {
            beacon_ssid(frame)
        } else {
            None
        };
        Some(CapturedFrame {
            kind: header.kind,
            addr1: header.addr1,
            addr2: header.addr2,
            ssid,
            rssi: meta.rssi,
            channel: meta.channel,
            len: meta.len,
            at: Instant::now(),
        })
    }
}

impl FrameSink for CaptureTap {
    fn on_frame(&self, frame: &[u8], meta: RxMeta) {
        self.counters.record_frame();
        let Some(record) = self.classify(frame, meta) else {
            return;
        };

        match self.queue.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                self.counters.record_overflow();
                trace!(kind = %record.kind, "Capture queue full, record dropped");
            }
            // Consumer gone, the capture is shutting down
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
