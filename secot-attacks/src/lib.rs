//! Active attacks for SECoT
//!
//! Each module implements one [`secot_core::Attack`] against a shared
//! [`secot_core::Radio`]:
//!
//! ### Deauthentication
//! Bursts of spoofed deauthentication frames against one client or the
//! whole network. See [`deauth`] module for details.
//!
//! ### Beacon Flood
//! Fake access points announced by a sweeping stream of beacons.
//! See [`beacon`] module for details.
//!
//! ### Probe Request Spam
//! Broadcast probe requests for many network names.
//! See [`probe`] module for details.
//!
//! ### ARP Spoofing
//! Forged ARP replies that impersonate the gateway and/or MQTT broker.
//! See [`arp_spoof`] module for details.
//!
//! The beacon and probe attacks share their SSID list and channel sweep
//! through [`ssid::SsidCycle`].

pub mod arp_spoof;
pub mod beacon;
pub mod deauth;
pub mod probe;
pub mod ssid;

// Re-export attack implementations for convenience
pub use arp_spoof::{ArpSpoof, Peer, SpoofMode};
pub use beacon::BeaconFlood;
pub use deauth::Deauth;
pub use probe::ProbeSpam;
pub use ssid::SsidCycle;
