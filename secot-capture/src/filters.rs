//! Frame class filters shared between the capture callback and the attack

use secot_packet::ieee80211::subtype;
use secot_packet::{FrameKind, FrameType};
use std::sync::atomic::{AtomicBool, Ordering};

/// Toggleable frame classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureClass {
    /// Beacon frames
    Beacons,
    /// Probe requests and probe responses
    Probes,
    /// Data frames
    Data,
    /// All management frames
    Management,
    /// Control frames
    Control,
}

/// Class toggles, read by the capture callback on every frame
///
/// Atomics let the operator flip a toggle from the main loop while the
/// radio context keeps classifying.
#[derive(Debug)]
pub struct CaptureSwitches {
    beacons: AtomicBool,
    probes: AtomicBool,
    data: AtomicBool,
    management: AtomicBool,
    control: AtomicBool,
}

impl CaptureSwitches {
    fn flag(&self, class: CaptureClass) -> &AtomicBool {
        match class {
            CaptureClass::Beacons => &self.beacons,
            CaptureClass::Probes => &self.probes,
            CaptureClass::Data => &self.data,
            CaptureClass::Management => &self.management,
            CaptureClass::Control => &self.control,
        }
    }

    pub fn get(&self, class: CaptureClass) -> bool {
        self.flag(class).load(Ordering::Relaxed)
    }

    pub fn set(&self, class: CaptureClass, enabled: bool) {
        self.flag(class).store(enabled, Ordering::Relaxed);
    }

    /// Whether a frame of this kind should be kept
    pub fn accepts(&self, kind: FrameKind) -> bool {
        match kind.frame_type {
            FrameType::Management => {
                if !self.get(CaptureClass::Management) {
                    return false;
                }
                match kind.subtype {
                    subtype::BEACON => self.get(CaptureClass::Beacons),
                    subtype::PROBE_REQ | subtype::PROBE_RESP => self.get(CaptureClass::Probes),
                    _ => true,
                }
            }
            FrameType::Control => self.get(CaptureClass::Control),
            FrameType::Data => self.get(CaptureClass::Data),
            FrameType::Extension => true,
        }
    }
}

impl Default for CaptureSwitches {
    fn default() -> Self {
        Self {
            beacons: AtomicBool::new(true),
            probes: AtomicBool::new(true),
            data: AtomicBool::new(true),
            management: AtomicBool::new(true),
            control: AtomicBool::new(false),
        }
    }
}
