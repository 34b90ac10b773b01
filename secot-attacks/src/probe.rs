//! Probe request spamming
//!
//! Floods the air with broadcast probe requests for a list of network
//! names, as if many clients were looking for them.

use async_trait::async_trait;
use secot_core::config::{DEFAULT_PROBE_INTERVAL, MIN_FLOOD_INTERVAL};
use secot_core::parameter::{
    describe_options, format_interval, get_option, parse_interval, render_options, set_option,
    Access, OptionInfo, OptionSpec, ParameterMap, ParameterType,
};
use secot_core::{Attack, AttackKind, AttackState, Error, Radio, RadioMode, Result};
use secot_packet::probe_request_frame;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::ssid::SsidCycle;

/// Probe Request Spam Attack
pub struct ProbeSpam {
    state: AttackState,
    radio: Arc<dyn Radio>,
    cycle: SsidCycle,
    interval: Duration,
}

impl ProbeSpam {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            state: AttackState::new(),
            radio,
            cycle: SsidCycle::new(),
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    pub fn cycle(&self) -> &SsidCycle {
        &self.cycle
    }

    fn send_probe(&mut self) {
        let Some(ssid) = self.cycle.current() else {
            return;
        };
        let src = self.cycle.source_mac(self.radio.mac_address());

        let outcome = probe_request_frame(src, ssid).and_then(|frame| {
            let sent = self.radio.transmit_80211(&frame);
            self.state.record_tx(&sent, frame.len());
            sent
        });
        match outcome {
            Ok(()) => trace!(ssid = %ssid, src = %src, "Probe request sent"),
            Err(e) => warn!(ssid = %ssid, error = %e, "Probe request not sent"),
        }
    }
}

static PROBE_OPTIONS: &[OptionSpec<ProbeSpam>] = &[OptionSpec {
    name: "interval",
    description: "Milliseconds between probe requests",
    value_type: ParameterType::Millis,
    access: Access::ReadWrite,
    secret: false,
    set: |a, v| {
        a.interval = parse_interval("interval", v, MIN_FLOOD_INTERVAL)?;
        Ok(())
    },
    get: |a| format_interval(a.interval),
}];

#[async_trait]
impl Attack for ProbeSpam {
    fn kind(&self) -> AttackKind {
        AttackKind::ProbeSpam
    }

    fn name(&self) -> &'static str {
        "Probe Request Spam"
    }

    fn state(&self) -> &AttackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AttackState {
        &mut self.state
    }

    async fn on_start(&mut self) -> Result<()> {
        if !self.cycle.prepare() {
            return Err(Error::configuration("No SSIDs to probe"));
        }

        self.radio.disconnect()?;
        self.radio.set_mode(RadioMode::Station)?;
        self.radio.set_channel(self.cycle.channel())?;
        self.radio.set_promiscuous(true)?;

        info!(ssids = self.cycle.ssids().len(), "Spamming probe requests");
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
        self.send_probe();

        if let Some(channel) = self.cycle.advance() {
            debug!(channel, "Probe sweep moved to next channel");
            if let Err(e) = self.radio.set_channel(channel) {
                warn!(channel, error = %e, "Channel change failed");
            }
        }
    }

    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        match set_option(PROBE_OPTIONS, self, name, value) {
            Err(Error::UnknownParameter(_)) => self.cycle.apply(name, value),
            other => other,
        }
    }

    fn read_parameter(&self, name: &str) -> Result<String> {
        match get_option(PROBE_OPTIONS, self, name) {
            Err(Error::UnknownParameter(_)) => self.cycle.read(name),
            other => other,
        }
    }

    fn parameters(&self) -> ParameterMap {
        let mut params = self.cycle.render();
        params.extend(render_options(PROBE_OPTIONS, self));
        params
    }

    fn options(&self) -> Vec<OptionInfo> {
        let mut options = self.cycle.describe();
        options.extend(describe_options(PROBE_OPTIONS));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secot_core::{AttackStatus, SimRadio};

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_fails() {
        let radio = Arc::new(SimRadio::new());
        let mut attack = ProbeSpam::new(radio);
        attack.set_parameter("clear", "").unwrap();
        attack.set_parameter("random", "0").unwrap();

        let err = attack.start(Duration::ZERO).await.unwrap_err();
        assert_eq!(err.to_string(), "No SSIDs to probe");
        assert_eq!(attack.last_error(), Some("No SSIDs to probe"));
        assert_eq!(attack.status(), AttackStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_frames_and_sweep() {
        let radio = Arc::new(SimRadio::new());
        let mut attack = ProbeSpam::new(radio.clone());
        attack.set_parameter("add", "Home").unwrap();
        attack.set_parameter("add", "Office").unwrap();
        attack.set_parameter("startchannel", "1").unwrap();
        attack.set_parameter("endchannel", "2").unwrap();

        attack.start(Duration::ZERO).await.unwrap();
        for _ in 0..4 {
            attack.update().await;
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        let sent = radio.sent_80211();
        let channels: Vec<u8> = sent.iter().map(|f| f.channel).collect();
        assert_eq!(channels, vec![1, 1, 2, 2]);

        let first = &sent[0].bytes;
        assert_eq!(&first[0..2], &[0x40, 0x00]);
        assert_eq!(&first[24..30], &[0x00, 4, b'H', b'o', b'm', b'e']);
        assert_eq!(first.len(), 26 + 4 + 44);
        assert!(secot_core::MacAddr::from_slice(&first[10..16])
            .unwrap()
            .is_locally_administered());
        assert_eq!(radio.channel(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_duration() {
        let radio = Arc::new(SimRadio::new());
        let mut attack = ProbeSpam::new(radio.clone());
        attack.start(Duration::from_millis(200)).await.unwrap();

        let started = tokio::time::Instant::now();
        while started.elapsed() <= Duration::from_millis(250) {
            attack.update().await;
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        assert_eq!(attack.status(), AttackStatus::Idle);
        // 0, 50, 100, 150 ms
        assert_eq!(radio.sent_80211().len(), 4);
    }

    #[test]
    fn test_defaults() {
        let attack = ProbeSpam::new(Arc::new(SimRadio::new()));
        assert_eq!(attack.get_parameter("interval").unwrap(), "50");
        assert_eq!(attack.get_parameter("count").unwrap(), "20");
        assert_eq!(attack.get_parameter("prefix").unwrap(), "WiFi-");
        assert_eq!(attack.get_parameter("randommac").unwrap(), "true");
        assert!(attack.get_parameter("encryption").is_err());
    }
}
