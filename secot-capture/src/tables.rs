//! Device table and packet ring
//!
//! Both are owned by the main loop. The device table has a hard capacity
//! and refuses newcomers once full; the packet ring evicts its oldest
//! entry instead.

use secot_core::MacAddr;
use secot_packet::ieee80211::subtype;
use secot_packet::{FrameKind, FrameType};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, VecDeque};
use tokio::time::Instant;

use crate::stats::ClassCounters;
use crate::tap::CapturedFrame;

fn seconds_since<S: Serializer>(at: &Instant, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(at.elapsed().as_secs())
}

fn name_or_empty<S: Serializer>(ssid: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(ssid.as_deref().unwrap_or(""))
}

fn frame_name<S: Serializer>(kind: &FrameKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.name())
}

// ============================================================================
// Devices
// ============================================================================

/// A station or access point seen on the air
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SniffedDevice {
    pub mac: MacAddr,
    #[serde(serialize_with = "name_or_empty")]
    pub ssid: Option<String>,
    pub rssi: i8,
    pub channel: u8,
    #[serde(serialize_with = "seconds_since")]
    pub last_seen: Instant,
    pub packet_count: u32,
    pub is_ap: bool,
}

/// One sighting of a device
#[derive(Debug, Clone, Copy)]
pub struct Sighting<'a> {
    pub mac: MacAddr,
    pub ssid: Option<&'a str>,
    pub rssi: i8,
    pub channel: u8,
    pub at: Instant,
    pub is_ap: bool,
}

impl<'a> Sighting<'a> {
    fn of(frame: &CapturedFrame, mac: MacAddr, ssid: Option<&'a str>, is_ap: bool) -> Self {
        Self {
            mac,
            ssid,
            rssi: frame.rssi,
            channel: frame.channel,
            at: frame.at,
            is_ap,
        }
    }
}

/// Devices keyed by link address
#[derive(Debug, Clone)]
pub struct DeviceTable {
    devices: BTreeMap<MacAddr, SniffedDevice>,
    capacity: usize,
}

impl DeviceTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            devices: BTreeMap::new(),
            capacity,
        }
    }

    /// Record a sighting
    ///
    /// Known devices are updated in place. A new device is inserted only
    /// while the table is below capacity; returns false when it was refused.
    pub fn upsert(&mut self, sighting: Sighting<'_>) -> bool {
        let named_ap = match (sighting.is_ap, sighting.ssid) {
            (true, Some(ssid)) if !ssid.is_empty() => Some(ssid),
            _ => None,
        };

        if let Some(device) = self.devices.get_mut(&sighting.mac) {
            device.rssi = sighting.rssi;
            device.channel = sighting.channel;
            device.last_seen = sighting.at;
            device.packet_count = device.packet_count.saturating_add(1);
            if let Some(ssid) = named_ap {
                device.ssid = Some(ssid.to_string());
                device.is_ap = true;
            }
            return true;
        }

        if self.devices.len() >= self.capacity {
            return false;
        }
        self.devices.insert(
            sighting.mac,
            SniffedDevice {
                mac: sighting.mac,
                ssid: named_ap.map(str::to_string),
                rssi: sighting.rssi,
                channel: sighting.channel,
                last_seen: sighting.at,
                packet_count: 1,
                is_ap: sighting.is_ap,
            },
        );
        true
    }

    pub fn get(&self, mac: &MacAddr) -> Option<&SniffedDevice> {
        self.devices.get(mac)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ap_count(&self) -> usize {
        self.devices.values().filter(|d| d.is_ap).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SniffedDevice> {
        self.devices.values()
    }

    /// Devices matching the report filters, in address order
    ///
    /// `ssid` must match exactly; an empty filter matches everything.
    pub fn filtered(&self, bssid: Option<MacAddr>, ssid: &str) -> Vec<SniffedDevice> {
        self.devices
            .values()
            .filter(|d| bssid.map_or(true, |b| d.mac == b))
            .filter(|d| ssid.is_empty() || d.ssid.as_deref() == Some(ssid))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

// ============================================================================
// Packets
// ============================================================================

/// A captured frame kept in the history ring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SniffedPacket {
    #[serde(rename = "type", serialize_with = "frame_name")]
    pub kind: FrameKind,
    pub src: Option<MacAddr>,
    pub dst: Option<MacAddr>,
    pub rssi: i8,
    pub channel: u8,
    #[serde(rename = "time", serialize_with = "seconds_since")]
    pub at: Instant,
    pub length: usize,
}

impl From<&CapturedFrame> for SniffedPacket {
    fn from(frame: &CapturedFrame) -> Self {
        Self {
            kind: frame.kind,
            src: frame.addr2,
            dst: frame.addr1,
            rssi: frame.rssi,
            channel: frame.channel,
            at: frame.at,
            length: frame.len,
        }
    }
}

/// Fixed-size history, oldest entry evicted first
#[derive(Debug, Clone)]
pub struct PacketRing {
    packets: VecDeque<SniffedPacket>,
    capacity: usize,
}

impl PacketRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, packet: SniffedPacket) {
        if self.capacity == 0 {
            return;
        }
        while self.packets.len() >= self.capacity {
            self.packets.pop_front();
        }
        self.packets.push_back(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SniffedPacket> {
        self.packets.iter()
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Everything the main loop builds from captured records
#[derive(Debug, Clone)]
pub struct CaptureTables {
    pub classes: ClassCounters,
    pub devices: DeviceTable,
    pub packets: PacketRing,
}

impl CaptureTables {
    pub fn new(max_devices: usize, max_packets: usize) -> Self {
        Self {
            classes: ClassCounters::default(),
            devices: DeviceTable::new(max_devices),
            packets: PacketRing::new(max_packets),
        }
    }

    /// Fold one record into the counters, the device table and the ring
    pub fn ingest(&mut self, frame: &CapturedFrame) {
        match frame.kind.frame_type {
            FrameType::Management => match frame.kind.subtype {
                subtype::BEACON => {
                    self.classes.beacons += 1;
                    if let (Some(ssid), Some(bssid)) = (frame.ssid.as_deref(), frame.addr2) {
                        self.devices.upsert(Sighting::of(frame, bssid, Some(ssid), true));
                    }
                }
                subtype::PROBE_REQ => {
                    self.classes.probe_requests += 1;
                    if let Some(station) = frame.addr2 {
                        self.devices.upsert(Sighting::of(frame, station, None, false));
                    }
                }
                subtype::PROBE_RESP => self.classes.probe_responses += 1,
                subtype::DEAUTH => self.classes.deauths += 1,
                _ => {}
            },
            FrameType::Data => {
                self.classes.data += 1;
                for mac in [frame.addr1, frame.addr2].into_iter().flatten() {
                    self.devices.upsert(Sighting::of(frame, mac, None, false));
                }
            }
            FrameType::Control | FrameType::Extension => {}
        }

        self.packets.push(SniffedPacket::from(frame));
    }

    pub fn clear(&mut self) {
        self.classes = ClassCounters::default();
        self.devices.clear();
        self.packets.clear();
    }
}
