//! Radio abstraction
//!
//! Attacks never touch a driver directly. Everything they need from the
//! shared wireless radio goes through [`Radio`]: mode and channel control,
//! raw frame injection, promiscuous capture, and the station-side
//! operations (scan, join, neighbour lookup) used for target discovery.

use crate::{MacAddr, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Radio operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RadioMode {
    /// No association; used for pure injection and capture
    Null,
    /// Station mode; required for scanning and joining
    Station,
}

/// One access point reported by an active scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPoint {
    pub ssid: String,
    pub bssid: MacAddr,
    pub channel: u8,
    pub rssi: i8,
}

/// Metadata the radio attaches to a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMeta {
    /// Signal strength in dBm
    pub rssi: i8,
    pub channel: u8,
    /// Length reported by the radio
    pub len: usize,
}

/// Receiver of promiscuous-mode frames
///
/// Called from the radio's own context; implementations must not block.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, frame: &[u8], meta: RxMeta);
}

/// Radio trait implemented by hardware drivers and the in-memory simulator
#[async_trait]
pub trait Radio: Send + Sync {
    /// Station interface MAC address
    fn mac_address(&self) -> MacAddr;

    /// IPv4 address while joined to a network
    fn ipv4_address(&self) -> Option<Ipv4Addr>;

    fn set_mode(&self, mode: RadioMode) -> Result<()>;

    fn set_channel(&self, channel: u8) -> Result<()>;

    fn channel(&self) -> u8;

    fn set_promiscuous(&self, enabled: bool) -> Result<()>;

    /// Install or remove the receiver of promiscuous frames
    fn set_frame_sink(&self, sink: Option<Arc<dyn FrameSink>>);

    /// Inject a raw 802.11 frame on the current channel
    fn transmit_80211(&self, frame: &[u8]) -> Result<()>;

    /// Send a raw Ethernet II frame on the joined network
    fn transmit_ethernet(&self, frame: &[u8]) -> Result<()>;

    /// Active scan for access points
    async fn scan(&self) -> Result<Vec<AccessPoint>>;

    /// Join a network, waiting for the link to come up
    async fn join(&self, ssid: &str, password: &str) -> Result<()>;

    fn is_joined(&self) -> bool;

    fn disconnect(&self) -> Result<()>;

    /// Look up a peer in the neighbour (ARP) table
    fn neighbor_lookup(&self, ip: Ipv4Addr) -> Option<MacAddr>;
}
