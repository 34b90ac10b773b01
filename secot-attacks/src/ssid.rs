//! SSID work list and channel cursor shared by the flooding attacks
//!
//! Beacon flooding and probe spamming walk the same structure: send one
//! frame for the current SSID, move to the next, and once the list wraps
//! move the radio to the next channel of the configured range.

use rand::Rng;
use secot_core::config::{DEFAULT_SSID_COUNT, DEFAULT_SSID_PREFIX, MAX_SSID_LENGTH, MAX_SSID_LIST};
use secot_core::parameter::{
    describe_options, format_bool, get_option, parse_bool, parse_ranged, render_options,
    set_option, Access, OptionInfo, OptionSpec, ParameterMap, ParameterType,
};
use secot_core::{ChannelRange, Error, MacAddr, Result};

/// Ordered SSID list consumed round-robin with a channel cursor
#[derive(Debug, Clone)]
pub struct SsidCycle {
    ssids: Vec<String>,
    random: bool,
    count: usize,
    prefix: String,
    random_mac: bool,
    channels: ChannelRange,
    index: usize,
    channel: u8,
}

impl SsidCycle {
    pub fn new() -> Self {
        let channels = ChannelRange::default();
        Self {
            ssids: Vec::new(),
            random: true,
            count: DEFAULT_SSID_COUNT,
            prefix: DEFAULT_SSID_PREFIX.to_string(),
            random_mac: true,
            channels,
            index: 0,
            channel: channels.start(),
        }
    }

    /// Get ready for a run: regenerate random names and rewind the cursor.
    /// Returns false when there is nothing to send.
    pub fn prepare(&mut self) -> bool {
        if self.random {
            self.regenerate();
        }
        self.index = 0;
        self.channel = self.channels.start();
        !self.ssids.is_empty()
    }

    /// Replace the list with `count` random names
    pub fn regenerate(&mut self) {
        let mut rng = rand::thread_rng();
        self.ssids = (0..self.count)
            .map(|_| random_ssid(&mut rng, &self.prefix))
            .collect();
    }

    /// SSID the next frame should carry
    pub fn current(&self) -> Option<&str> {
        self.ssids.get(self.index).map(String::as_str)
    }

    /// Move to the next SSID. When the list wraps the channel cursor moves
    /// too, and the new channel is returned.
    pub fn advance(&mut self) -> Option<u8> {
        if self.ssids.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.ssids.len();
        if self.index == 0 {
            self.channel = self.channels.next_after(self.channel);
            Some(self.channel)
        } else {
            None
        }
    }

    /// Channel the cursor is on
    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn channels(&self) -> ChannelRange {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ssids(&self) -> &[String] {
        &self.ssids
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    /// Address the next frame is sent from
    pub fn source_mac(&self, device: MacAddr) -> MacAddr {
        if self.random_mac {
            random_mac(&mut rand::thread_rng())
        } else {
            device
        }
    }

    /// Append one SSID and switch to the custom list
    ///
    /// The list is rendered comma separated with trimmed entries, so names
    /// containing a comma or surrounding whitespace are refused.
    pub fn add(&mut self, ssid: &str) -> Result<()> {
        if ssid.is_empty() || ssid.len() > MAX_SSID_LENGTH {
            return Err(Error::invalid_parameter("add", "Invalid SSID length"));
        }
        if !is_listable(ssid) {
            return Err(Error::invalid_parameter("add", "Invalid SSID"));
        }
        if self.ssids.len() >= MAX_SSID_LIST {
            return Err(Error::invalid_parameter(
                "add",
                "Maximum number of SSIDs reached",
            ));
        }
        self.ssids.push(ssid.to_string());
        self.random = false;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.ssids.clear();
        self.index = 0;
    }

    /// Replace the list from a comma separated string
    pub fn set_list(&mut self, value: &str) -> Result<()> {
        let list: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if list.len() > MAX_SSID_LIST {
            return Err(Error::invalid_parameter(
                "ssids",
                "Maximum number of SSIDs reached",
            ));
        }
        if list.iter().any(|s| s.len() > MAX_SSID_LENGTH) {
            return Err(Error::invalid_parameter("ssids", "Invalid SSID length"));
        }
        self.ssids = list;
        self.index = 0;
        self.random = false;
        Ok(())
    }

    fn list_string(&self) -> String {
        self.ssids.join(", ")
    }

    pub fn apply(&mut self, name: &str, value: &str) -> Result<()> {
        set_option(SSID_OPTIONS, self, name, value)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        get_option(SSID_OPTIONS, self, name)
    }

    pub fn render(&self) -> ParameterMap {
        render_options(SSID_OPTIONS, self)
    }

    pub fn describe(&self) -> Vec<OptionInfo> {
        describe_options(SSID_OPTIONS)
    }
}

/// Survives a trip through the comma separated `ssids` option
fn is_listable(ssid: &str) -> bool {
    !ssid.contains(',') && ssid.trim() == ssid
}

impl Default for SsidCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// `prefix` followed by 3 to 7 characters, each a digit with probability
/// 1/3 and an uppercase letter otherwise
pub fn random_ssid<R: Rng>(rng: &mut R, prefix: &str) -> String {
    let len = rng.gen_range(3..=7);
    let mut ssid = String::with_capacity(prefix.len() + len);
    ssid.push_str(prefix);
    for _ in 0..len {
        let c = if rng.gen_ratio(1, 3) {
            char::from(b'0' + rng.gen_range(0..10u8))
        } else {
            char::from(b'A' + rng.gen_range(0..26u8))
        };
        ssid.push(c);
    }
    ssid
}

/// Random locally administered unicast address
pub fn random_mac<R: Rng>(rng: &mut R) -> MacAddr {
    MacAddr::local_unicast(rng.gen())
}

/// Options common to beacon flooding and probe spamming
pub static SSID_OPTIONS: &[OptionSpec<SsidCycle>] = &[
    OptionSpec {
        name: "ssids",
        description: "Comma separated SSID list (replaces the custom list)",
        value_type: ParameterType::List,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| c.set_list(v),
        get: |c| c.list_string(),
    },
    OptionSpec {
        name: "random",
        description: "Generate random SSIDs at start",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            c.random = parse_bool("random", v)?;
            Ok(())
        },
        get: |c| format_bool(c.random),
    },
    OptionSpec {
        name: "count",
        description: "Number of random SSIDs",
        value_type: ParameterType::U32,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            c.count = parse_ranged("count", v, 1, MAX_SSID_LIST as u32)? as usize;
            Ok(())
        },
        get: |c| c.count.to_string(),
    },
    OptionSpec {
        name: "prefix",
        description: "Prefix of random SSIDs",
        value_type: ParameterType::String,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            if v.contains(',') || v.trim_start() != v {
                return Err(Error::invalid_parameter("prefix", "Invalid SSID prefix"));
            }
            c.prefix = v.to_string();
            Ok(())
        },
        get: |c| c.prefix.clone(),
    },
    OptionSpec {
        name: "randommac",
        description: "Send every frame from a fresh random address",
        value_type: ParameterType::Bool,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            c.random_mac = parse_bool("randommac", v)?;
            Ok(())
        },
        get: |c| format_bool(c.random_mac),
    },
    OptionSpec {
        name: "startchannel",
        description: "First channel of the sweep",
        value_type: ParameterType::Channel,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            let channel = v.trim().parse().unwrap_or(0);
            c.channels.set_start(channel)
        },
        get: |c| c.channels.start().to_string(),
    },
    OptionSpec {
        name: "endchannel",
        description: "Last channel of the sweep",
        value_type: ParameterType::Channel,
        access: Access::ReadWrite,
        secret: false,
        set: |c, v| {
            let channel = v.trim().parse().unwrap_or(0);
            c.channels.set_end(channel)
        },
        get: |c| c.channels.end().to_string(),
    },
    OptionSpec {
        name: "add",
        description: "Append an SSID to the custom list",
        value_type: ParameterType::String,
        access: Access::Action,
        secret: false,
        set: |c, v| c.add(v),
        get: secot_core::parameter::not_readable,
    },
    OptionSpec {
        name: "clear",
        description: "Empty the SSID list",
        value_type: ParameterType::String,
        access: Access::Action,
        secret: false,
        set: |c, _| {
            c.clear();
            Ok(())
        },
        get: secot_core::parameter::not_readable,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_ssid_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let ssid = random_ssid(&mut rng, "WiFi-");
            let suffix = ssid.strip_prefix("WiFi-").unwrap();
            assert!((3..=7).contains(&suffix.len()));
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_random_mac_is_local_unicast() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let mac = random_mac(&mut rng);
            assert!(mac.is_locally_administered());
            assert!(!mac.is_multicast());
        }
    }

    #[test]
    fn test_prepare_generates_count() {
        let mut cycle = SsidCycle::new();
        cycle.apply("count", "5").unwrap();
        assert!(cycle.prepare());
        assert_eq!(cycle.ssids().len(), 5);
        assert_eq!(cycle.channel(), 1);
    }

    #[test]
    fn test_empty_custom_list() {
        let mut cycle = SsidCycle::new();
        cycle.apply("random", "false").unwrap();
        assert!(!cycle.prepare());
        assert_eq!(cycle.current(), None);
        assert_eq!(cycle.advance(), None);
    }

    #[test]
    fn test_add_switches_to_custom_list() {
        let mut cycle = SsidCycle::new();
        cycle.apply("add", "Corp").unwrap();
        assert!(!cycle.is_random());
        assert!(cycle.apply("add", "").is_err());
        assert!(cycle.apply("add", &"x".repeat(33)).is_err());

        for i in 1..MAX_SSID_LIST {
            cycle.add(&format!("net{}", i)).unwrap();
        }
        let err = cycle.add("one-too-many").unwrap_err();
        assert!(err.to_string().contains("Maximum number of SSIDs reached"));

        cycle.apply("clear", "").unwrap();
        assert!(cycle.ssids().is_empty());
    }

    #[test]
    fn test_wraps_channels() {
        let mut cycle = SsidCycle::new();
        cycle.apply("ssids", "a, b").unwrap();
        cycle.apply("startchannel", "10").unwrap();
        cycle.apply("endchannel", "11").unwrap();
        assert!(cycle.prepare());

        assert_eq!(cycle.advance(), None);
        assert_eq!(cycle.advance(), Some(11));
        assert_eq!(cycle.advance(), None);
        assert_eq!(cycle.advance(), Some(10));
        assert_eq!(cycle.current(), Some("a"));
    }

    #[test]
    fn test_channel_options_autocorrect() {
        let mut cycle = SsidCycle::new();
        cycle.apply("startchannel", "13").unwrap();
        assert_eq!(cycle.read("endchannel").unwrap(), "13");
        assert!(cycle.apply("endchannel", "15").is_err());
        assert!(cycle.apply("startchannel", "abc").is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let mut cycle = SsidCycle::new();
        cycle.apply("ssids", "Alpha,Beta").unwrap();
        cycle.apply("random", "true").unwrap();
        cycle.apply("prefix", "Lab-").unwrap();
        cycle.apply("endchannel", "6").unwrap();

        let rendered = cycle.render();
        let mut copy = SsidCycle::new();
        for (name, value) in rendered.iter() {
            copy.apply(name, value).unwrap();
        }
        assert_eq!(copy.render(), rendered);
        assert_eq!(copy.ssids(), &["Alpha".to_string(), "Beta".to_string()]);
    }

    #[test]
    fn test_unlistable_names_refused() {
        let mut cycle = SsidCycle::new();
        assert!(cycle.add("Cafe,Guest").is_err());
        assert!(cycle.add(" Lobby").is_err());
        assert!(cycle.add("Lobby ").is_err());
        assert!(cycle.apply("prefix", "a,b").is_err());
        assert!(cycle.apply("prefix", " Lab").is_err());
        assert!(cycle.ssids().is_empty());

        cycle.add("Cafe Guest").unwrap();
        cycle.add("Lobby").unwrap();
        let before = cycle.ssids().to_vec();
        let mut copy = SsidCycle::new();
        for (name, value) in cycle.render().iter() {
            copy.apply(name, value).unwrap();
        }
        assert_eq!(copy.ssids(), before.as_slice());
    }
}
