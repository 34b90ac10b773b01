//! Beacon flooding
//!
//! Announces a list of fake access points by injecting one beacon per tick,
//! cycling through the SSID list and sweeping a channel range.

use async_trait::async_trait;
use secot_core::config::{DEFAULT_BEACON_INTERVAL, MIN_FLOOD_INTERVAL};
use secot_core::parameter::{
    describe_options, format_bool, format_interval, get_option, parse_bool, parse_interval,
    render_options, set_option, Access, OptionInfo, OptionSpec, ParameterMap, ParameterType,
};
use secot_core::{Attack, AttackKind, AttackState, Error, Radio, RadioMode, Result};
use secot_packet::beacon_frame;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::ssid::SsidCycle;

/// Beacon Flooding Attack
pub struct BeaconFlood {
    state: AttackState,
    radio: Arc<dyn Radio>,
    cycle: SsidCycle,
    interval: Duration,
    encryption: bool,
}

impl BeaconFlood {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            state: AttackState::new(),
            radio,
            cycle: SsidCycle::new(),
            interval: DEFAULT_BEACON_INTERVAL,
            encryption: true,
        }
    }

    /// SSID list and channel cursor
    pub fn cycle(&self) -> &SsidCycle {
        &self.cycle
    }

    fn send_beacon(&mut self) {
        let Some(ssid) = self.cycle.current() else {
            return;
        };
        let channel = self.cycle.channel();
        let bssid = self.cycle.source_mac(self.radio.mac_address());

        let outcome = beacon_frame(bssid, ssid, channel, self.encryption)
            .and_then(|frame| {
                let sent = self.radio.transmit_80211(&frame);
                self.state.record_tx(&sent, frame.len());
                sent
            });
        match outcome {
            Ok(()) => trace!(ssid = %ssid, channel, bssid = %bssid, "Beacon sent"),
            Err(e) => warn!(ssid = %ssid, error = %e, "Beacon not sent"),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

static BEACON_OPTIONS: &[OptionSpec<BeaconFlood>] = &[
    OptionSpec {
        name: "interval",
        description: "Milliseconds between beacons",
        value_type: ParameterType::Millis,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.interval = parse_interval("interval", v, MIN_FLOOD_INTERVAL)?;
            Ok(())
        },
        get: |a| format_interval(a.interval),
    },
    OptionSpec {
        name: "encryption",
        description: "Advertise WPA2 (RSN element)",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.encryption = parse_bool("encryption", v)?;
            Ok(())
        },
        get: |a| format_bool(a.encryption),
    },
];

// ============================================================================
// Attack
// ============================================================================

#[async_trait]
impl Attack for BeaconFlood {
    fn kind(&self) -> AttackKind {
        AttackKind::BeaconFlood
    }

    fn name(&self) -> &'static str {
        "Beacon Flood"
    }

    fn state(&self) -> &AttackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AttackState {
        &mut self.state
    }

    async fn on_start(&mut self) -> Result<()> {
        if !self.cycle.prepare() {
            return Err(Error::configuration("No SSIDs to broadcast"));
        }

        self.radio.disconnect()?;
        self.radio.set_mode(RadioMode::Station)?;
        self.radio.set_channel(self.cycle.channel())?;
        self.radio.set_promiscuous(true)?;

        let channels = self.cycle.channels();
        info!(
            ssids = self.cycle.ssids().len(),
            start_channel = channels.start(),
            end_channel = channels.end(),
            "Broadcasting beacons"
        );
        Ok(())
    }

    async fn on_stop(&mut self) {
        if let Err(e) = self.radio.set_promiscuous(false) {
            warn!(error = %e, "Failed to leave promiscuous mode");
        }
        if let Err(e) = self.radio.disconnect() {
            warn!(error = %e, "Failed to reset radio");
        }
    }

    async fn on_tick(&mut self) {
        if !self.state.action_due(self.interval) {
            return;
        }
        self.send_beacon();

        if let Some(channel) = self.cycle.advance() {
            debug!(channel, "Beacon sweep moved to next channel");
            if let Err(e) = self.radio.set_channel(channel) {
                warn!(channel, error = %e, "Channel change failed");
            }
        }
    }

    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        match set_option(BEACON_OPTIONS, self, name, value) {
            Err(Error::UnknownParameter(_)) => self.cycle.apply(name, value),
            other => other,
        }
    }

    fn read_parameter(&self, name: &str) -> Result<String> {
        match get_option(BEACON_OPTIONS, self, name) {
            Err(Error::UnknownParameter(_)) => self.cycle.read(name),
            other => other,
        }
    }

    fn parameters(&self) -> ParameterMap {
        let mut params = self.cycle.render();
        params.extend(render_options(BEACON_OPTIONS, self));
        params
    }

    fn options(&self) -> Vec<OptionInfo> {
        let mut options = self.cycle.describe();
        options.extend(describe_options(BEACON_OPTIONS));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secot_core::{AttackStatus, SimRadio};
    use secot_packet::beacon_ssid;

    fn setup() -> (Arc<SimRadio>, BeaconFlood) {
        let radio = Arc::new(SimRadio::new());
        let attack = BeaconFlood::new(radio.clone());
        (radio, attack)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_fails() {
        let (_radio, mut attack) = setup();
        attack.set_parameter("random", "false").unwrap();

        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "No SSIDs to broadcast");
        assert_eq!(attack.status(), AttackStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_wraps_after_full_cycle() {
        let (radio, mut attack) = setup();
        attack.set_parameter("ssids", "One,Two,Three").unwrap();
        attack.set_parameter("startchannel", "3").unwrap();
        attack.set_parameter("endchannel", "5").unwrap();
        attack.set_parameter("randommac", "false").unwrap();
        attack.set_parameter("interval", "10").unwrap();

        attack.start(Duration::ZERO).await.unwrap();
        assert_eq!(radio.mode(), RadioMode::Station);
        assert!(radio.is_promiscuous());

        // S * (c1 - c0 + 1) ticks
        for _ in 0..9 {
            attack.update().await;
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        let sent = radio.sent_80211();
        assert_eq!(sent.len(), 9);
        let channels: Vec<u8> = sent.iter().map(|f| f.channel).collect();
        assert_eq!(channels, vec![3, 3, 3, 4, 4, 4, 5, 5, 5]);
        let names: Vec<_> = sent.iter().filter_map(|f| beacon_ssid(&f.bytes)).collect();
        assert_eq!(names[..3], ["One", "Two", "Three"]);
        assert!(sent
            .iter()
            .all(|f| &f.bytes[10..16] == SimRadio::DEFAULT_MAC.as_bytes()));

        assert_eq!(attack.cycle().index(), 0);
        assert_eq!(attack.cycle().channel(), 3);
        assert_eq!(radio.channel(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_gates_frames() {
        let (radio, mut attack) = setup();
        attack.set_parameter("count", "4").unwrap();
        attack.start(Duration::ZERO).await.unwrap();

        attack.update().await;
        attack.update().await;
        tokio::time::advance(Duration::from_millis(99)).await;
        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_mac_and_encryption() {
        let (radio, mut attack) = setup();
        attack.set_parameter("ssids", "Net").unwrap();
        attack.start(Duration::ZERO).await.unwrap();
        attack.update().await;

        let frame = &radio.sent_80211()[0].bytes;
        let bssid = secot_core::MacAddr::from_slice(&frame[10..16]).unwrap();
        assert!(bssid.is_locally_administered());
        assert_eq!(frame.len(), 38 + 3 + 13 + 22);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tx_failure_is_counted_not_fatal() {
        let (radio, mut attack) = setup();
        radio.set_fail_tx(true);
        attack.start(Duration::ZERO).await.unwrap();
        attack.update().await;

        assert_eq!(attack.status(), AttackStatus::Running);
        assert_eq!(attack.stats().tx_errors, 1);
        assert_eq!(attack.stats().frames_sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_radio() {
        let (radio, mut attack) = setup();
        attack.start(Duration::ZERO).await.unwrap();
        attack.stop().await.unwrap();
        assert!(!radio.is_promiscuous());
        attack.update().await;
        assert_eq!(attack.status(), AttackStatus::Idle);

        // Restartable
        attack.start(Duration::ZERO).await.unwrap();
        assert!(attack.is_running());
    }

    #[test]
    fn test_parameters_round_trip() {
        let radio = Arc::new(SimRadio::new());
        let mut attack = BeaconFlood::new(radio.clone());
        attack.set_parameter("ssids", "A,B").unwrap();
        attack.set_parameter("interval", "250").unwrap();
        attack.set_parameter("encryption", "0").unwrap();

        let rendered = attack.parameters();
        assert_eq!(rendered.get("interval"), Some("250"));
        assert_eq!(rendered.get("ssids"), Some("A, B"));
        assert_eq!(rendered.get("add"), None);

        let mut copy = BeaconFlood::new(radio);
        for (name, value) in rendered.iter() {
            copy.set_parameter(name, value).unwrap();
        }
        assert_eq!(copy.parameters(), rendered);
    }

    #[test]
    fn test_interval_floor() {
        let mut attack = BeaconFlood::new(Arc::new(SimRadio::new()));
        assert!(attack.set_parameter("interval", "9").is_err());
        assert_eq!(attack.get_parameter("interval").unwrap(), "100");
        assert!(attack.get_parameter("nonsense").is_err());
    }
}
