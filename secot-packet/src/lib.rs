//! Frame construction and parsing library for SECoT
//!
//! This crate synthesizes the raw frames the attacks inject and decodes the
//! little of each captured frame the passive capture needs:
//!
//! - [`template`] - Fixed templates with bounds-checked patching
//! - [`ieee80211`] - Deauthentication, beacon and probe request frames,
//!   MAC header and frame type decoding
//! - [`arp`] - ARP requests and replies in Ethernet II frames
//!
//! # Quick Start
//!
//! ```rust
//! use secot_core::MacAddr;
//! use secot_packet::ieee80211::{beacon_frame, deauth_frame};
//!
//! let ap = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
//! let deauth = deauth_frame(MacAddr::BROADCAST, ap, ap).unwrap();
//! assert_eq!(deauth.len(), 26);
//!
//! let beacon = beacon_frame(ap, "FreeWiFi", 6, false).unwrap();
//! assert_eq!(beacon.len(), 38 + 8 + 13);
//! ```

pub mod arp;
pub mod ieee80211;
pub mod template;

// Re-export commonly used types for convenience
pub use arp::{arp_request_frame, arp_spoof_frame, ArpOpcode, ArpPacket};
pub use ieee80211::{
    beacon_frame, beacon_ssid, deauth_frame, probe_request_frame, FrameKind, FrameType, MacHeader,
};
pub use template::{write_at, FrameBuilder, FrameTemplate};
