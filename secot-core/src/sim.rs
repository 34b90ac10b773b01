//! In-memory radio for host runs and tests
//!
//! `SimRadio` records every transmission together with the channel it went
//! out on, answers scans and neighbour lookups from scripted tables, and
//! can feed frames into the installed capture sink.

use crate::radio::{AccessPoint, FrameSink, Radio, RadioMode, RxMeta};
use crate::{Error, MacAddr, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::trace;

/// A frame handed to the simulated radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub channel: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
struct SimState {
    mac: MacAddr,
    lease: Ipv4Addr,
    mode: RadioMode,
    channel: u8,
    promiscuous: bool,
    joined: Option<String>,
    networks: Vec<AccessPoint>,
    neighbors: HashMap<Ipv4Addr, MacAddr>,
    sent_80211: Vec<SentFrame>,
    sent_ethernet: Vec<Vec<u8>>,
    fail_tx: bool,
    fail_join: bool,
    scans: u32,
    joins: u32,
}

/// Simulated radio
pub struct SimRadio {
    state: Mutex<SimState>,
    sink: Mutex<Option<Arc<dyn FrameSink>>>,
}

impl SimRadio {
    /// Default station address (Espressif OUI)
    pub const DEFAULT_MAC: MacAddr = MacAddr([0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56]);

    /// Address handed out on join
    pub const DEFAULT_LEASE: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

    pub fn new() -> Self {
        Self::with_mac(Self::DEFAULT_MAC)
    }

    pub fn with_mac(mac: MacAddr) -> Self {
        Self {
            state: Mutex::new(SimState {
                mac,
                lease: Self::DEFAULT_LEASE,
                mode: RadioMode::Null,
                channel: 1,
                promiscuous: false,
                joined: None,
                networks: Vec::new(),
                neighbors: HashMap::new(),
                sent_80211: Vec::new(),
                sent_ethernet: Vec::new(),
                fail_tx: false,
                fail_join: false,
                scans: 0,
                joins: 0,
            }),
            sink: Mutex::new(None),
        }
    }

    /// Add an access point to the scan results
    pub fn add_network(&self, ap: AccessPoint) {
        self.state.lock().networks.push(ap);
    }

    /// Add an entry to the neighbour table
    pub fn add_neighbor(&self, ip: Ipv4Addr, mac: MacAddr) {
        self.state.lock().neighbors.insert(ip, mac);
    }

    pub fn set_fail_tx(&self, fail: bool) {
        self.state.lock().fail_tx = fail;
    }

    pub fn set_fail_join(&self, fail: bool) {
        self.state.lock().fail_join = fail;
    }

    /// Simulate the link to the joined network going down
    pub fn drop_link(&self) {
        self.state.lock().joined = None;
    }

    pub fn sent_80211(&self) -> Vec<SentFrame> {
        self.state.lock().sent_80211.clone()
    }

    pub fn sent_ethernet(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent_ethernet.clone()
    }

    /// Forget everything transmitted so far
    pub fn clear_sent(&self) {
        let mut state = self.state.lock();
        state.sent_80211.clear();
        state.sent_ethernet.clear();
    }

    pub fn mode(&self) -> RadioMode {
        self.state.lock().mode
    }

    pub fn is_promiscuous(&self) -> bool {
        self.state.lock().promiscuous
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().is_some()
    }

    pub fn joined_ssid(&self) -> Option<String> {
        self.state.lock().joined.clone()
    }

    pub fn scan_count(&self) -> u32 {
        self.state.lock().scans
    }

    pub fn join_count(&self) -> u32 {
        self.state.lock().joins
    }

    /// Deliver a received frame to the sink, as the driver would in
    /// promiscuous mode. Returns false if nothing was listening.
    pub fn inject_frame(&self, frame: &[u8], rssi: i8) -> bool {
        let (promiscuous, channel) = {
            let state = self.state.lock();
            (state.promiscuous, state.channel)
        };
        if !promiscuous {
            return false;
        }
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => {
                sink.on_frame(
                    frame,
                    RxMeta {
                        rssi,
                        channel,
                        len: frame.len(),
                    },
                );
                true
            }
            None => false,
        }
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Radio for SimRadio {
    fn mac_address(&self) -> MacAddr {
        self.state.lock().mac
    }

    fn ipv4_address(&self) -> Option<Ipv4Addr> {
        let state = self.state.lock();
        state.joined.as_ref().map(|_| state.lease)
    }

    fn set_mode(&self, mode: RadioMode) -> Result<()> {
        self.state.lock().mode = mode;
        Ok(())
    }

    fn set_channel(&self, channel: u8) -> Result<()> {
        crate::types::validate_channel("channel", channel)?;
        self.state.lock().channel = channel;
        Ok(())
    }

    fn channel(&self) -> u8 {
        self.state.lock().channel
    }

    fn set_promiscuous(&self, enabled: bool) -> Result<()> {
        self.state.lock().promiscuous = enabled;
        Ok(())
    }

    fn set_frame_sink(&self, sink: Option<Arc<dyn FrameSink>>) {
        *self.sink.lock() = sink;
    }

    fn transmit_80211(&self, frame: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_tx {
            return Err(Error::Transmission("radio refused frame".to_string()));
        }
        let channel = state.channel;
        trace!(channel, len = frame.len(), "80211 tx");
        state.sent_80211.push(SentFrame {
            channel,
            bytes: frame.to_vec(),
        });
        Ok(())
    }

    fn transmit_ethernet(&self, frame: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_tx {
            return Err(Error::Transmission("radio refused frame".to_string()));
        }
        if state.joined.is_none() {
            return Err(Error::Transmission("not joined".to_string()));
        }
        trace!(len = frame.len(), "ethernet tx");
        state.sent_ethernet.push(frame.to_vec());
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<AccessPoint>> {
        let mut state = self.state.lock();
        state.scans += 1;
        Ok(state.networks.clone())
    }

    async fn join(&self, ssid: &str, _password: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.joins += 1;
        if state.fail_join {
            return Err(Error::radio(format!("Failed to join network '{}'", ssid)));
        }
        state.mode = RadioMode::Station;
        state.joined = Some(ssid.to_string());
        Ok(())
    }

    fn is_joined(&self) -> bool {
        self.state.lock().joined.is_some()
    }

    fn disconnect(&self) -> Result<()> {
        self.state.lock().joined = None;
        Ok(())
    }

    fn neighbor_lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let state = self.state.lock();
        if state.joined.is_none() {
            return None;
        }
        state.neighbors.get(&ip).copied()
    }
}
