//! IEEE 802.11 management frames
//!
//! Templates for the three frames the attacks inject (deauthentication,
//! beacon, probe request) and the minimal header decoding needed to
//! classify captured frames.
//!
//! Multi-byte fixed fields are little-endian as on the air.

use crate::template::FrameTemplate;
use secot_core::config::MAX_SSID_LENGTH;
use secot_core::{Error, MacAddr, Result};
use serde::Serialize;
use std::fmt;

/// Offset of address 1 (receiver) in the MAC header
pub const ADDR1_OFFSET: usize = 4;
/// Offset of address 2 (transmitter)
pub const ADDR2_OFFSET: usize = 10;
/// Offset of address 3 (BSSID)
pub const ADDR3_OFFSET: usize = 16;
/// Length of a management frame MAC header
pub const MAC_HEADER_LEN: usize = 24;

/// Tag id of the SSID element
pub const TAG_SSID: u8 = 0;

// ============================================================================
// Deauthentication
// ============================================================================

/// Total length of a deauthentication frame
pub const DEAUTH_FRAME_LEN: usize = 26;

const DEAUTH_HEAD: &[u8] = &[
    0xc0, 0x00, // frame control: management / deauthentication
    0x00, 0x00, // duration
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1: receiver
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // addr2: transmitter
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // addr3: bssid
    0x00, 0x00, // sequence control
    0x01, 0x00, // reason: unspecified
];

pub const DEAUTH_TEMPLATE: FrameTemplate = FrameTemplate::new("deauth", DEAUTH_HEAD, &[]);

/// Build a deauthentication frame from `src` to `dst` within `bssid`
pub fn deauth_frame(dst: MacAddr, src: MacAddr, bssid: MacAddr) -> Result<Vec<u8>> {
    let mut frame = DEAUTH_TEMPLATE.instantiate();
    frame
        .patch(ADDR1_OFFSET, dst.as_bytes())?
        .patch(ADDR2_OFFSET, src.as_bytes())?
        .patch(ADDR3_OFFSET, bssid.as_bytes())?;
    Ok(frame.finish())
}

// ============================================================================
// Beacon
// ============================================================================

/// Offset of the SSID element length byte in a beacon
pub const BEACON_SSID_LEN_OFFSET: usize = 37;

const BEACON_HEAD: &[u8] = &[
    0x80, 0x00, // frame control: management / beacon
    0x00, 0x00, // duration
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1: broadcast
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // addr2: bssid
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // addr3: bssid
    0x00, 0x00, // sequence control
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // timestamp
    0x64, 0x00, // beacon interval: 100 TU
    0x01, 0x00, // capability: ESS
    TAG_SSID, 0x00, // SSID element, length patched
];

const BEACON_TAIL: &[u8] = &[
    // supported rates
    0x01, 0x08, 0x82, 0x84, 0x8b, 0x96, 0x0c, 0x12, 0x18, 0x24,
    // DS parameter set, channel patched
    0x03, 0x01, 0x01,
    // RSN: WPA2 PSK / CCMP
    0x30, 0x14, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01,
    0x00, 0x00, 0x0f, 0xac, 0x02, 0x00, 0x00,
];

/// Supported rates + DS parameter set
const BEACON_OPEN_TAIL_LEN: usize = 13;
/// Offset of the channel byte inside the tail
const BEACON_DS_CHANNEL: usize = 12;
/// Length of the RSN element
pub const RSN_ELEMENT_LEN: usize = 22;

pub const BEACON_TEMPLATE: FrameTemplate = FrameTemplate::new("beacon", BEACON_HEAD, BEACON_TAIL);

/// Build a beacon announcing `ssid` from `bssid` on `channel`
///
/// The SSID is truncated to 32 bytes. With `encrypted` the frame carries
/// the RSN element and advertises WPA2.
pub fn beacon_frame(bssid: MacAddr, ssid: &str, channel: u8, encrypted: bool) -> Result<Vec<u8>> {
    let mut frame = BEACON_TEMPLATE.instantiate();
    frame
        .patch(ADDR2_OFFSET, bssid.as_bytes())?
        .patch(ADDR3_OFFSET, bssid.as_bytes())?
        .push_element(BEACON_SSID_LEN_OFFSET, ssid.as_bytes(), MAX_SSID_LENGTH)?;

    let tail = frame.tail_offset();
    if encrypted {
        frame.push_tail();
    } else {
        frame.push_tail_prefix(BEACON_OPEN_TAIL_LEN);
    }
    frame.patch_u8(tail + BEACON_DS_CHANNEL, channel)?;
    Ok(frame.finish())
}

// ============================================================================
// Probe request
// ============================================================================

/// Offset of the SSID element length byte in a probe request
pub const PROBE_SSID_LEN_OFFSET: usize = 25;

const PROBE_HEAD: &[u8] = &[
    0x40, 0x00, // frame control: management / probe request
    0x00, 0x00, // duration
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1: broadcast
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // addr2: source
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr3: broadcast
    0x00, 0x00, // sequence control
    TAG_SSID, 0x00, // SSID element, length patched
];

const PROBE_TAIL: &[u8] = &[
    // supported rates
    0x01, 0x08, 0x82, 0x84, 0x8b, 0x96, 0x0c, 0x12, 0x18, 0x24,
    // extended supported rates
    0x32, 0x04, 0x30, 0x48, 0x60, 0x6c,
    // HT capabilities
    0x2d, 0x1a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const PROBE_TEMPLATE: FrameTemplate = FrameTemplate::new("probe", PROBE_HEAD, PROBE_TAIL);

/// Build a broadcast probe request for `ssid` from `src`
pub fn probe_request_frame(src: MacAddr, ssid: &str) -> Result<Vec<u8>> {
    let mut frame = PROBE_TEMPLATE.instantiate();
    frame
        .patch(ADDR2_OFFSET, src.as_bytes())?
        .push_element(PROBE_SSID_LEN_OFFSET, ssid.as_bytes(), MAX_SSID_LENGTH)?
        .push_tail();
    Ok(frame.finish())
}

// ============================================================================
// Header decoding
// ============================================================================

/// Frame type from bits 2-3 of the frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

/// Management subtypes
pub mod subtype {
    pub const ASSOC_REQ: u8 = 0;
    pub const ASSOC_RESP: u8 = 1;
    pub const REASSOC_REQ: u8 = 2;
    pub const REASSOC_RESP: u8 = 3;
    pub const PROBE_REQ: u8 = 4;
    pub const PROBE_RESP: u8 = 5;
    pub const BEACON: u8 = 8;
    pub const ATIM: u8 = 9;
    pub const DISASSOC: u8 = 10;
    pub const AUTH: u8 = 11;
    pub const DEAUTH: u8 = 12;
}

/// Decoded frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameKind {
    pub frame_type: FrameType,
    pub subtype: u8,
}

impl FrameKind {
    /// Decode from the first frame control byte
    pub fn from_fc(fc: u8) -> Self {
        Self {
            frame_type: FrameType::from_bits((fc & 0x0c) >> 2),
            subtype: (fc & 0xf0) >> 4,
        }
    }

    pub fn is_management(&self, subtype: u8) -> bool {
        self.frame_type == FrameType::Management && self.subtype == subtype
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self.frame_type {
            FrameType::Management => match self.subtype {
                subtype::ASSOC_REQ => "Association Request",
                subtype::ASSOC_RESP => "Association Response",
                subtype::REASSOC_REQ => "Reassociation Request",
                subtype::REASSOC_RESP => "Reassociation Response",
                subtype::PROBE_REQ => "Probe Request",
                subtype::PROBE_RESP => "Probe Response",
                subtype::BEACON => "Beacon",
                subtype::ATIM => "ATIM",
                subtype::DISASSOC => "Disassociation",
                subtype::AUTH => "Authentication",
                subtype::DEAUTH => "Deauthentication",
                _ => "Management",
            },
            FrameType::Control => "Control",
            FrameType::Data => "Data",
            FrameType::Extension => "Unknown",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The parts of an 802.11 MAC header the capture path looks at
///
/// Addresses are optional because control frames (and truncated captures)
/// may end before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacHeader {
    pub kind: FrameKind,
    pub addr1: Option<MacAddr>,
    pub addr2: Option<MacAddr>,
}

impl MacHeader {
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() < 2 {
            return Err(Error::PacketParsing("802.11 frame too short".to_string()));
        }
        let addr = |offset: usize| {
            frame
                .get(offset..offset + 6)
                .and_then(MacAddr::from_slice)
        };
        Ok(Self {
            kind: FrameKind::from_fc(frame[0]),
            addr1: addr(ADDR1_OFFSET),
            addr2: addr(ADDR2_OFFSET),
        })
    }
}

/// Network name carried by a beacon's first tagged element
///
/// Only returned when the element is an SSID element with a length of
/// 1 to 32 bytes that fits inside the frame.
pub fn beacon_ssid(frame: &[u8]) -> Option<String> {
    // header + timestamp(8) + interval(2) + capability(2)
    const FIRST_TAG: usize = MAC_HEADER_LEN + 12;
    let id = *frame.get(FIRST_TAG)?;
    let len = usize::from(*frame.get(FIRST_TAG + 1)?);
    if id != TAG_SSID || len == 0 || len > MAX_SSID_LENGTH {
        return None;
    }
    let payload = frame.get(FIRST_TAG + 2..FIRST_TAG + 2 + len)?;
    Some(String::from_utf8_lossy(payload).into_owned())
}
