//! ARP packets and their Ethernet II framing
//!
//! Unlike 802.11 fixed fields, everything here is big-endian.

use bytes::{BufMut, BytesMut};
use secot_core::{Error, MacAddr, Result};
use std::net::Ipv4Addr;

/// ARP EtherType
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// Hardware types
pub const HTYPE_ETHERNET: u16 = 1;

/// Protocol types
pub const PTYPE_IPV4: u16 = 0x0800;

/// Length of the ARP body for Ethernet/IPv4
pub const ARP_LEN: usize = 28;

/// Length of an Ethernet II header
pub const ETHERNET_HEADER_LEN: usize = 14;

/// ARP Operation Codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    /// ARP Request
    Request = 1,
    /// ARP Reply
    Reply = 2,
}

impl ArpOpcode {
    pub fn from_u16(val: u16) -> Option<Self> {
        match val {
            1 => Some(Self::Request),
            2 => Some(Self::Reply),
            _ => None,
        }
    }
}

/// ARP Packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    /// Operation
    pub operation: ArpOpcode,
    /// Sender hardware address (MAC)
    pub sender_hw_addr: MacAddr,
    /// Sender protocol address (IP)
    pub sender_proto_addr: Ipv4Addr,
    /// Target hardware address (MAC)
    pub target_hw_addr: MacAddr,
    /// Target protocol address (IP)
    pub target_proto_addr: Ipv4Addr,
}

impl ArpPacket {
    /// Create new ARP request (who-has `target_ip`)
    pub fn new_request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            operation: ArpOpcode::Request,
            sender_hw_addr: sender_mac,
            sender_proto_addr: sender_ip,
            target_hw_addr: MacAddr::ZERO, // Unknown in request
            target_proto_addr: target_ip,
        }
    }

    /// Create new ARP reply (`sender_ip` is-at `sender_mac`)
    pub fn new_reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            operation: ArpOpcode::Reply,
            sender_hw_addr: sender_mac,
            sender_proto_addr: sender_ip,
            target_hw_addr: target_mac,
            target_proto_addr: target_ip,
        }
    }

    /// Parse ARP packet from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_LEN {
            return Err(Error::PacketParsing("ARP packet too short".to_string()));
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || data[4] != 6 || data[5] != 4 {
            return Err(Error::PacketParsing(
                "ARP packet is not Ethernet/IPv4".to_string(),
            ));
        }

        let op_val = u16::from_be_bytes([data[6], data[7]]);
        let operation = ArpOpcode::from_u16(op_val)
            .ok_or_else(|| Error::PacketParsing("Invalid ARP opcode".to_string()))?;

        let mac = |range: std::ops::Range<usize>| {
            MacAddr::from_slice(&data[range])
                .ok_or_else(|| Error::PacketParsing("bad hardware address".to_string()))
        };

        Ok(Self {
            operation,
            sender_hw_addr: mac(8..14)?,
            sender_proto_addr: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_hw_addr: mac(18..24)?,
            target_proto_addr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    /// Serialize ARP packet to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ARP_LEN);
        self.write(&mut buf);
        buf.to_vec()
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u16(HTYPE_ETHERNET);
        buf.put_u16(PTYPE_IPV4);
        buf.put_u8(6);
        buf.put_u8(4);
        buf.put_u16(self.operation as u16);
        buf.put_slice(self.sender_hw_addr.as_bytes());
        buf.put_slice(&self.sender_proto_addr.octets());
        buf.put_slice(self.target_hw_addr.as_bytes());
        buf.put_slice(&self.target_proto_addr.octets());
    }

    /// Wrap the packet in an Ethernet II frame
    pub fn to_ethernet(&self, dst: MacAddr, src: MacAddr) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ETHERNET_HEADER_LEN + ARP_LEN);
        buf.put_slice(dst.as_bytes());
        buf.put_slice(src.as_bytes());
        buf.put_u16(ETHERTYPE_ARP);
        self.write(&mut buf);
        buf.to_vec()
    }

    /// Check if this is a request
    pub fn is_request(&self) -> bool {
        self.operation == ArpOpcode::Request
    }

    /// Check if this is a reply
    pub fn is_reply(&self) -> bool {
        self.operation == ArpOpcode::Reply
    }
}

/// Broadcast who-has request for `target_ip`
pub fn arp_request_frame(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Vec<u8> {
    ArpPacket::new_request(sender_mac, sender_ip, target_ip).to_ethernet(MacAddr::BROADCAST, sender_mac)
}

/// Forged reply telling `victim` that `claimed_ip` is at `attacker_mac`
pub fn arp_spoof_frame(
    attacker_mac: MacAddr,
    claimed_ip: Ipv4Addr,
    victim_mac: MacAddr,
    victim_ip: Ipv4Addr,
) -> Vec<u8> {
    ArpPacket::new_reply(attacker_mac, claimed_ip, victim_mac, victim_ip)
        .to_ethernet(victim_mac, attacker_mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACKER: MacAddr = MacAddr([0x24, 0x0a, 0xc4, 0x00, 0x00, 0x01]);
    const VICTIM: MacAddr = MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

    #[test]
    fn test_arp_request_creation() {
        let sender_ip = Ipv4Addr::new(192, 168, 1, 50);
        let target_ip = Ipv4Addr::new(192, 168, 1, 1);

        let packet = ArpPacket::new_request(ATTACKER, sender_ip, target_ip);

        assert_eq!(packet.operation, ArpOpcode::Request);
        assert_eq!(packet.target_hw_addr, MacAddr::ZERO);
        assert!(packet.is_request());
    }

    #[test]
    fn test_spoof_frame_layout() {
        let gateway = Ipv4Addr::new(192, 168, 1, 1);
        let victim_ip = Ipv4Addr::new(192, 168, 1, 101);
        let frame = arp_spoof_frame(ATTACKER, gateway, VICTIM, victim_ip);

        assert_eq!(frame.len(), 42);
        assert_eq!(&frame[0..6], VICTIM.as_bytes());
        assert_eq!(&frame[6..12], ATTACKER.as_bytes());
        assert_eq!(&frame[12..14], &[0x08, 0x06]);
        assert_eq!(&frame[14..22], &[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x02]);
        assert_eq!(&frame[22..28], ATTACKER.as_bytes());
        assert_eq!(&frame[28..32], &[192, 168, 1, 1]);
        assert_eq!(&frame[32..38], VICTIM.as_bytes());
        assert_eq!(&frame[38..42], &[192, 168, 1, 101]);
    }

    #[test]
    fn test_request_frame_is_broadcast() {
        let frame = arp_request_frame(
            ATTACKER,
            Ipv4Addr::new(10, 0, 0, 5),
            Ipv4Addr::new(10, 0, 0, 1),
        );
        assert_eq!(&frame[0..6], &[0xff; 6]);
        let parsed = ArpPacket::parse(&frame[ETHERNET_HEADER_LEN..]).unwrap();
        assert!(parsed.is_request());
        assert_eq!(parsed.target_proto_addr, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ArpPacket::parse(&[0u8; 10]).is_err());
        let mut body = ArpPacket::new_request(ATTACKER, Ipv4Addr::UNSPECIFIED, Ipv4Addr::UNSPECIFIED)
            .serialize();
        body[7] = 9;
        assert!(ArpPacket::parse(&body).is_err());
    }
}
