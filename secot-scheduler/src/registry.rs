//! Closed registry of attack instances
//!
//! Every attack kind has exactly one slot. The set is fixed at compile
//! time, so lookups by kind can never miss a variant.

use secot_attacks::{ArpSpoof, BeaconFlood, Deauth, ProbeSpam};
use secot_capture::PassiveCapture;
use secot_core::{
    Attack, AttackKind, AttackStats, AttackStatus, OptionInfo, ParameterMap, Radio,
};
use serde::Serialize;
use std::sync::Arc;

/// One attack instance, tagged by kind
pub enum AttackSlot {
    Deauth(Deauth),
    BeaconFlood(BeaconFlood),
    ProbeSpam(ProbeSpam),
    ArpSpoof(ArpSpoof),
    PassiveCapture(PassiveCapture),
}

impl AttackSlot {
    /// Build the attack for `kind` on the shared radio
    pub fn new(kind: AttackKind, radio: Arc<dyn Radio>) -> Self {
        match kind {
            AttackKind::Deauth => AttackSlot::Deauth(Deauth::new(radio)),
            AttackKind::BeaconFlood => AttackSlot::BeaconFlood(BeaconFlood::new(radio)),
            AttackKind::ProbeSpam => AttackSlot::ProbeSpam(ProbeSpam::new(radio)),
            AttackKind::ArpSpoof => AttackSlot::ArpSpoof(ArpSpoof::new(radio)),
            AttackKind::PassiveCapture => AttackSlot::PassiveCapture(PassiveCapture::new(radio)),
        }
    }

    pub fn kind(&self) -> AttackKind {
        self.as_attack().kind()
    }

    pub fn as_attack(&self) -> &dyn Attack {
        match self {
            AttackSlot::Deauth(a) => a,
            AttackSlot::BeaconFlood(a) => a,
            AttackSlot::ProbeSpam(a) => a,
            AttackSlot::ArpSpoof(a) => a,
            AttackSlot::PassiveCapture(a) => a,
        }
    }

    pub fn as_attack_mut(&mut self) -> &mut dyn Attack {
        match self {
            AttackSlot::Deauth(a) => a,
            AttackSlot::BeaconFlood(a) => a,
            AttackSlot::ProbeSpam(a) => a,
            AttackSlot::ArpSpoof(a) => a,
            AttackSlot::PassiveCapture(a) => a,
        }
    }

    /// Status snapshot for front ends
    pub fn info(&self) -> AttackInfo {
        let attack = self.as_attack();
        AttackInfo {
            kind: attack.kind(),
            tag: attack.kind().tag(),
            name: attack.name(),
            status: attack.status(),
            last_error: attack.last_error().map(str::to_string),
            parameters: attack.parameters(),
            options: attack.options(),
            stats: attack.stats(),
        }
    }
}

/// Information about one attack
#[derive(Debug, Clone, Serialize)]
pub struct AttackInfo {
    pub kind: AttackKind,
    /// Numeric tag used by command front ends
    pub tag: u8,
    pub name: &'static str,
    pub status: AttackStatus,
    pub last_error: Option<String>,
    pub parameters: ParameterMap,
    /// Option schema, for front ends building forms or help text
    pub options: Vec<OptionInfo>,
    pub stats: AttackStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secot_core::SimRadio;

    #[test]
    fn test_slot_matches_kind() {
        let radio: Arc<dyn Radio> = Arc::new(SimRadio::new());
        for kind in AttackKind::ALL {
            let slot = AttackSlot::new(kind, radio.clone());
            assert_eq!(slot.kind(), kind);
            assert_eq!(slot.as_attack().status(), AttackStatus::Idle);
        }
    }

    #[test]
    fn test_info_snapshot() {
        let radio: Arc<dyn Radio> = Arc::new(SimRadio::new());
        let mut slot = AttackSlot::new(AttackKind::ArpSpoof, radio);
        slot.as_attack_mut()
            .set_parameter("password", "hunter22")
            .unwrap();
        assert!(slot.as_attack_mut().set_parameter("bogus", "1").is_err());

        let info = slot.info();
        assert_eq!(info.tag, 3);
        assert_eq!(info.name, "ARP Spoofing");
        assert_eq!(info.parameters.get("password"), Some("********"));
        assert!(info.last_error.is_some());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "arp_spoof");
        assert_eq!(json["status"], "IDLE");
        assert_eq!(json["parameters"]["mode"], "gateway");
        assert_eq!(json["options"][1]["name"], "password");
        assert_eq!(json["options"][1]["secret"], true);
        assert_eq!(json["options"][4]["type"], "ip_addr");
    }

    #[test]
    fn test_options_cover_parameters() {
        let radio: Arc<dyn Radio> = Arc::new(SimRadio::new());
        for kind in AttackKind::ALL {
            let info = AttackSlot::new(kind, radio.clone()).info();
            for (name, _) in info.parameters.iter() {
                let option = info.options.iter().find(|o| o.name == name).unwrap();
                assert!(!option.description.is_empty());
            }
            assert!(info.options.len() >= info.parameters.len());
        }

        let capture = AttackSlot::new(AttackKind::PassiveCapture, radio).info();
        let clear = capture.options.iter().find(|o| o.name == "clear").unwrap();
        assert_eq!(clear.access, secot_core::Access::Action);
    }
}
