//! Firmware-wide defaults and limits
//!
//! Runtime configuration lives in each attack's option schema; these are
//! the values the schemas start from and the hard caps they enforce.

use std::time::Duration;

/// Default attack duration (zero runs until stopped)
pub const DEFAULT_ATTACK_DURATION: Duration = Duration::ZERO;

/// Longest network name carried in an SSID element
pub const MAX_SSID_LENGTH: usize = 32;

// Deauthentication

pub const DEFAULT_DEAUTH_INTERVAL: Duration = Duration::from_millis(1000);
pub const MIN_DEAUTH_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_DEAUTH_FRAMES: u8 = 5;
pub const MAX_DEAUTH_FRAMES: u8 = 50;
/// Gap between the frame pairs of one burst
pub const DEAUTH_FRAME_GAP: Duration = Duration::from_millis(5);

// Beacon flood / probe spam

pub const MAX_SSID_LIST: usize = 50;
pub const DEFAULT_SSID_COUNT: usize = 20;
pub const DEFAULT_SSID_PREFIX: &str = "WiFi-";
pub const DEFAULT_BEACON_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(50);
pub const MIN_FLOOD_INTERVAL: Duration = Duration::from_millis(10);

// ARP spoofing

pub const DEFAULT_ARP_SPOOF_INTERVAL: Duration = Duration::from_millis(10_000);
pub const MIN_ARP_SPOOF_INTERVAL: Duration = Duration::from_millis(1000);
/// How long to wait for an ARP reply before checking the neighbour table
pub const ARP_REPLY_WAIT: Duration = Duration::from_millis(100);
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

// Passive capture

pub const MAX_SNIFF_DEVICES: usize = 100;
pub const MAX_PACKET_HISTORY: usize = 50;
pub const DEFAULT_HOP_INTERVAL: Duration = Duration::from_millis(500);
pub const MIN_HOP_INTERVAL: Duration = Duration::from_millis(100);
/// Depth of the queue between the capture callback and the main loop
pub const CAPTURE_QUEUE_DEPTH: usize = 256;

/// Marker rendered in place of secret option values
pub const REDACTED: &str = "********";
