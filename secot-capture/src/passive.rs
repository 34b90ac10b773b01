//! Passive capture attack
//!
//! Listens in promiscuous mode while hopping across a channel range,
//! building a table of the devices it hears and a short packet history.

use async_trait::async_trait;
use secot_core::config::{
    CAPTURE_QUEUE_DEPTH, DEFAULT_HOP_INTERVAL, MAX_PACKET_HISTORY, MAX_SNIFF_DEVICES,
    MIN_HOP_INTERVAL,
};
use secot_core::parameter::{
    describe_options, format_bool, format_interval, format_optional_mac, get_option, not_readable,
    not_writable, parse_bool, parse_interval, parse_optional_mac, render_options, set_option,
    Access, OptionInfo, OptionSpec, ParameterMap, ParameterType,
};
use secot_core::{
    Attack, AttackKind, AttackState, ChannelRange, FrameSink, MacAddr, Radio, RadioMode, Result,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::filters::{CaptureClass, CaptureSwitches};
use crate::stats::{CaptureCounters, TapCounters};
use crate::tables::{CaptureTables, SniffedDevice, SniffedPacket};
use crate::tap::{CaptureTap, CapturedFrame};

/// Capture defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveCaptureConfig {
    /// Channels visited by the hopper
    pub channels: ChannelRange,
    /// Time spent on each channel
    pub hop_interval: Duration,
    pub max_devices: usize,
    pub max_packets: usize,
    pub queue_depth: usize,
}

impl Default for PassiveCaptureConfig {
    fn default() -> Self {
        Self {
            channels: ChannelRange::default(),
            hop_interval: DEFAULT_HOP_INTERVAL,
            max_devices: MAX_SNIFF_DEVICES,
            max_packets: MAX_PACKET_HISTORY,
            queue_depth: CAPTURE_QUEUE_DEPTH,
        }
    }
}

/// Passive Capture Attack
pub struct PassiveCapture {
    state: AttackState,
    radio: Arc<dyn Radio>,
    config: PassiveCaptureConfig,
    switches: Arc<CaptureSwitches>,
    tap_counters: Arc<TapCounters>,
    queue: Option<mpsc::Receiver<CapturedFrame>>,
    tables: CaptureTables,
    filter_bssid: Option<MacAddr>,
    filter_ssid: String,
    channel: u8,
    last_hop: Instant,
}

impl PassiveCapture {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self::with_config(radio, PassiveCaptureConfig::default())
    }

    pub fn with_config(radio: Arc<dyn Radio>, config: PassiveCaptureConfig) -> Self {
        let tables = CaptureTables::new(config.max_devices, config.max_packets);
        let channel = config.channels.start();
        Self {
            state: AttackState::new(),
            radio,
            config,
            switches: Arc::new(CaptureSwitches::default()),
            tap_counters: Arc::new(TapCounters::new()),
            queue: None,
            tables,
            filter_bssid: None,
            filter_ssid: String::new(),
            channel,
            last_hop: Instant::now(),
        }
    }

    pub fn config(&self) -> &PassiveCaptureConfig {
        &self.config
    }

    /// Channel the radio is listening on
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Known devices matching the report filters
    pub fn devices(&self) -> Vec<SniffedDevice> {
        self.tables
            .devices
            .filtered(self.filter_bssid, &self.filter_ssid)
    }

    /// Packet history, oldest first
    pub fn packets(&self) -> Vec<SniffedPacket> {
        self.tables.packets.iter().cloned().collect()
    }

    pub fn counters(&self) -> CaptureCounters {
        let classes = self.tables.classes;
        CaptureCounters {
            total_packets: self.tap_counters.received(),
            beacon_count: classes.beacons,
            probe_req_count: classes.probe_requests,
            probe_resp_count: classes.probe_responses,
            deauth_count: classes.deauths,
            data_count: classes.data,
            queue_overflows: self.tap_counters.overflows(),
            device_count: self.tables.devices.len(),
            ap_count: self.tables.devices.ap_count(),
        }
    }

    /// Forget every device, packet and counter
    pub fn clear(&mut self) {
        self.tables.clear();
        self.tap_counters.reset();
    }

    /// Move queued records into the tables
    fn drain(&mut self) -> usize {
        let Some(queue) = self.queue.as_mut() else {
            return 0;
        };
        let mut drained = 0;
        while let Ok(frame) = queue.try_recv() {
            self.tables.ingest(&frame);
            drained += 1;
        }
        drained
    }

    fn hop(&mut self) {
        let next = self.config.channels.next_after(self.channel);
        match self.radio.set_channel(next) {
            Ok(()) => {
                debug!(from = self.channel, to = next, "Capture hopped channel");
                self.channel = next;
            }
            Err(e) => warn!(channel = next, error = %e, "Channel change failed"),
        }
        self.last_hop = Instant::now();
    }
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn set_class(capture: &PassiveCapture, class: CaptureClass, name: &str, value: &str) -> Result<()> {
    capture.switches.set(class, parse_bool(name, value)?);
    Ok(())
}

// ============================================================================
// Options
// ============================================================================

static CAPTURE_OPTIONS: &[OptionSpec<PassiveCapture>] = &[
    OptionSpec {
        name: "startchannel",
        description: "First channel of the hop range",
        value_type: ParameterType::Channel,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            let channel = v.trim().parse().unwrap_or(0);
            a.config.channels.set_start(channel)
        },
        get: |a| a.config.channels.start().to_string(),
    },
    OptionSpec {
        name: "endchannel",
        description: "Last channel of the hop range",
        value_type: ParameterType::Channel,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            let channel = v.trim().parse().unwrap_or(0);
            a.config.channels.set_end(channel)
        },
        get: |a| a.config.channels.end().to_string(),
    },
    OptionSpec {
        name: "hopinterval",
        description: "Milliseconds spent on each channel",
        value_type: ParameterType::Millis,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.config.hop_interval = parse_interval("hopinterval", v, MIN_HOP_INTERVAL)?;
            Ok(())
        },
        get: |a| format_interval(a.config.hop_interval),
    },
    OptionSpec {
        name: "beacons",
        description: "Capture beacon frames",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_class(a, CaptureClass::Beacons, "beacons", v),
        get: |a| format_bool(a.switches.get(CaptureClass::Beacons)),
    },
    OptionSpec {
        name: "probes",
        description: "Capture probe requests and responses",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_class(a, CaptureClass::Probes, "probes", v),
        get: |a| format_bool(a.switches.get(CaptureClass::Probes)),
    },
    OptionSpec {
        name: "data",
        description: "Capture data frames",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_class(a, CaptureClass::Data, "data", v),
        get: |a| format_bool(a.switches.get(CaptureClass::Data)),
    },
    OptionSpec {
        name: "management",
        description: "Capture management frames",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_class(a, CaptureClass::Management, "management", v),
        get: |a| format_bool(a.switches.get(CaptureClass::Management)),
    },
    OptionSpec {
        name: "control",
        description: "Capture control frames",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| set_class(a, CaptureClass::Control, "control", v),
        get: |a| format_bool(a.switches.get(CaptureClass::Control)),
    },
    OptionSpec {
        name: "filterbssid",
        description: "Only report this device",
        value_type: ParameterType::MacAddr,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.filter_bssid = parse_optional_mac("filterbssid", v)?;
            Ok(())
        },
        get: |a| format_optional_mac(a.filter_bssid),
    },
    OptionSpec {
        name: "filterssid",
        description: "Only report devices announcing this network",
        value_type: ParameterType::String,
        access: Access::ReadWrite,
        secret: false,
        set: |a, v| {
            a.filter_ssid = v.to_string();
            Ok(())
        },
        get: |a| a.filter_ssid.clone(),
    },
    OptionSpec {
        name: "clear",
        description: "Forget captured devices, packets and counters",
        value_type: ParameterType::String,
        access: Access::Action,
        secret: false,
        set: |a, _| {
            a.clear();
            Ok(())
        },
        get: not_readable,
    },
    OptionSpec {
        name: "channel",
        description: "Current channel",
        value_type: ParameterType::Channel,
        access: Access::ReadOnly,
        secret: false,
        set: not_writable,
        get: |a| a.channel.to_string(),
    },
    OptionSpec {
        name: "devices",
        description: "Device table (JSON)",
        value_type: ParameterType::String,
        access: Access::ReadOnly,
        secret: false,
        set: not_writable,
        get: |a| json(&a.devices()),
    },
    OptionSpec {
        name: "packets",
        description: "Packet history (JSON)",
        value_type: ParameterType::String,
        access: Access::ReadOnly,
        secret: false,
        set: not_writable,
        get: |a| json(&a.packets()),
    },
    OptionSpec {
        name: "stats",
        description: "Capture counters (JSON)",
        value_type: ParameterType::String,
        access: Access::ReadOnly,
        secret: false,
        set: not_writable,
        get: |a| json(&a.counters()),
    },
];

// ============================================================================
// Attack
// ============================================================================

#[async_trait]
impl Attack for PassiveCapture {
    fn kind(&self) -> AttackKind {
        AttackKind::PassiveCapture
    }

    fn name(&self) -> &'static str {
        "Passive Capture"
    }

    fn state(&self) -> &AttackState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AttackState {
        &mut self.state
    }

    async fn on_start(&mut self) -> Result<()> {
        self.clear();
        self.channel = self.config.channels.start();

        self.radio.disconnect()?;
        self.radio.set_mode(RadioMode::Null)?;
        self.radio.set_channel(self.channel)?;

        let (tap, queue) = CaptureTap::channel(
            Arc::clone(&self.switches),
            Arc::clone(&self.tap_counters),
            self.config.queue_depth,
        );
        let sink: Arc<dyn FrameSink> = tap;
        self.radio.set_frame_sink(Some(sink));
        self.queue = Some(queue);
        if let Err(e) = self.radio.set_promiscuous(true) {
            self.radio.set_frame_sink(None);
            self.queue = None;
            return Err(e);
        }
        self.last_hop = Instant::now();

        let channels = self.config.channels;
        info!(
            start_channel = channels.start(),
            end_channel = channels.end(),
            hop_interval_ms = self.config.hop_interval.as_millis() as u64,
            "Passive capture listening"
        );
        Ok(())
    }

    async fn on_stop(&mut self) {
        if let Err(e) = self.radio.set_promiscuous(false) {
            warn!(error = %e, "Failed to leave promiscuous mode");
        }
        self.radio.set_frame_sink(None);
        self.drain();
        self.queue = None;

        info!(summary = %self.counters().format(), "Passive capture stopped");
    }

    async fn on_tick(&mut self) {
        let drained = self.drain();
        if drained > 0 {
            debug!(records = drained, "Capture records ingested");
        }
        if self.last_hop.elapsed() >= self.config.hop_interval {
            self.hop();
        }
    }

    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        set_option(CAPTURE_OPTIONS, self, name, value)
    }

    fn read_parameter(&self, name: &str) -> Result<String> {
        get_option(CAPTURE_OPTIONS, self, name)
    }

    fn parameters(&self) -> ParameterMap {
        render_options(CAPTURE_OPTIONS, self)
    }

    fn options(&self) -> Vec<OptionInfo> {
        describe_options(CAPTURE_OPTIONS)
    }
}
