//! Common types used throughout SECoT

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddr = MacAddr([0x00; 6]);

    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Create a MAC address from a 6-byte slice
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Group bit (bit 0 of the first octet) is set
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Locally administered bit (bit 1 of the first octet) is set
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Force a locally administered unicast address out of arbitrary bytes
    pub fn local_unicast(mut bytes: [u8; 6]) -> Self {
        bytes[0] = (bytes[0] & 0xfe) | 0x02;
        Self(bytes)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 17 {
            return Err(crate::Error::invalid_parameter(
                "mac",
                "Invalid MAC address format",
            ));
        }

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(crate::Error::invalid_parameter(
                "mac",
                "Invalid MAC address format",
            ));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(crate::Error::invalid_parameter(
                    "mac",
                    "Invalid MAC address hex",
                ));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::invalid_parameter("mac", "Invalid MAC address hex"))?;
        }

        Ok(MacAddr(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Attack identifier
///
/// The discriminants are the numeric tags front ends use to address attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AttackKind {
    Deauth = 0,
    BeaconFlood = 1,
    ProbeSpam = 2,
    ArpSpoof = 3,
    PassiveCapture = 6,
}

impl AttackKind {
    /// Every kind, in registry order
    pub const ALL: [AttackKind; 5] = [
        AttackKind::Deauth,
        AttackKind::BeaconFlood,
        AttackKind::ProbeSpam,
        AttackKind::ArpSpoof,
        AttackKind::PassiveCapture,
    ];

    /// Short name used by command front ends
    pub fn shortname(self) -> &'static str {
        match self {
            AttackKind::Deauth => "deauth",
            AttackKind::BeaconFlood => "beacon",
            AttackKind::ProbeSpam => "probe",
            AttackKind::ArpSpoof => "arp",
            AttackKind::PassiveCapture => "sniff",
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shortname())
    }
}

impl TryFrom<u8> for AttackKind {
    type Error = crate::Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        AttackKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| crate::Error::NotFound(format!("attack type {}", tag)))
    }
}

impl FromStr for AttackKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(tag) = s.parse::<u8>() {
            return AttackKind::try_from(tag);
        }
        let lower = s.to_ascii_lowercase();
        AttackKind::ALL
            .into_iter()
            .find(|kind| kind.shortname() == lower)
            .ok_or_else(|| crate::Error::NotFound(format!("attack '{}'", s)))
    }
}

/// Lowest 2.4 GHz channel
pub const MIN_CHANNEL: u8 = 1;

/// Highest 2.4 GHz channel
pub const MAX_CHANNEL: u8 = 14;

/// Inclusive channel range with `start <= end` maintained on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelRange {
    start: u8,
    end: u8,
}

impl ChannelRange {
    /// Create a range; bounds are validated and ordered
    pub fn new(start: u8, end: u8) -> crate::Result<Self> {
        let mut range = Self {
            start: MIN_CHANNEL,
            end: MAX_CHANNEL,
        };
        range.set_start(start)?;
        range.set_end(end)?;
        Ok(range)
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Number of channels covered
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Set the lower bound, pulling the upper bound up if needed
    pub fn set_start(&mut self, channel: u8) -> crate::Result<()> {
        validate_channel("startchannel", channel)?;
        self.start = channel;
        if self.start > self.end {
            self.end = self.start;
        }
        Ok(())
    }

    /// Set the upper bound, pulling the lower bound down if needed
    pub fn set_end(&mut self, channel: u8) -> crate::Result<()> {
        validate_channel("endchannel", channel)?;
        self.end = channel;
        if self.end < self.start {
            self.start = self.end;
        }
        Ok(())
    }

    /// Channel following `current`, wrapping back to `start` after `end`
    pub fn next_after(&self, current: u8) -> u8 {
        let next = current.saturating_add(1);
        if next > self.end || next < self.start {
            self.start
        } else {
            next
        }
    }
}

impl Default for ChannelRange {
    fn default() -> Self {
        Self { start: 1, end: 11 }
    }
}

/// Check that a channel number is in 1-14
pub fn validate_channel(name: &str, channel: u8) -> crate::Result<()> {
    if (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
        Ok(())
    } else {
        Err(crate::Error::invalid_parameter(
            name,
            "Invalid channel (must be 1-14)",
        ))
    }
}
