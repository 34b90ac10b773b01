//! Attack scheduler
//!
//! The `AttackScheduler` owns one instance of every attack and drives them
//! from a single cooperative loop:
//!
//! - Lifecycle delegation (start, stop, stop all)
//! - One `tick()` per loop iteration, advancing every attack
//! - Queries by kind and in registry order
//!
//! The scheduler does not arbitrate the radio. Each attack configures the
//! mode it needs on start and leaves the radio restartable on stop.

use secot_capture::PassiveCapture;
use secot_core::{Attack, AttackKind, Error, Radio, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::registry::{AttackInfo, AttackSlot};

/// Scheduler multiplexing the radio among the attacks
pub struct AttackScheduler {
    slots: Vec<AttackSlot>,
}

impl AttackScheduler {
    /// Create the scheduler with one idle instance of every attack
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        let slots = AttackKind::ALL
            .into_iter()
            .map(|kind| AttackSlot::new(kind, Arc::clone(&radio)))
            .collect();
        info!(attacks = AttackKind::ALL.len(), "Creating new AttackScheduler");
        Self { slots }
    }

    /// Advance every attack by one step
    pub async fn tick(&mut self) {
        for slot in &mut self.slots {
            slot.as_attack_mut().update().await;
        }
    }

    /// Start an attack
    ///
    /// A zero `duration` runs until stopped. Failures are recorded on the
    /// attack and returned; other attacks are unaffected.
    pub async fn start(&mut self, kind: AttackKind, duration: Duration) -> Result<()> {
        debug!(attack = %kind, "Starting attack");
        self.attack_mut(kind)?.start(duration).await
    }

    /// Stop an attack
    pub async fn stop(&mut self, kind: AttackKind) -> Result<()> {
        debug!(attack = %kind, "Stopping attack");
        self.attack_mut(kind)?.stop().await
    }

    /// Stop every running attack, returning how many were stopped
    pub async fn stop_all(&mut self) -> usize {
        info!("Stopping all attacks");
        let mut stopped = 0;
        for slot in &mut self.slots {
            let attack = slot.as_attack_mut();
            if !attack.is_running() {
                continue;
            }
            match attack.stop().await {
                Ok(()) => stopped += 1,
                Err(e) => warn!(attack = %attack.kind(), error = %e, "Failed to stop attack"),
            }
        }
        stopped
    }

    pub fn is_any_running(&self) -> bool {
        self.slots.iter().any(|s| s.as_attack().is_running())
    }

    pub fn running_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.as_attack().is_running())
            .count()
    }

    pub fn get(&self, kind: AttackKind) -> Option<&dyn Attack> {
        self.slots
            .iter()
            .find(|s| s.kind() == kind)
            .map(AttackSlot::as_attack)
    }

    pub fn get_mut(&mut self, kind: AttackKind) -> Option<&mut dyn Attack> {
        self.slots
            .iter_mut()
            .find(|s| s.kind() == kind)
            .map(AttackSlot::as_attack_mut)
    }

    fn attack_mut(&mut self, kind: AttackKind) -> Result<&mut dyn Attack> {
        self.get_mut(kind)
            .ok_or_else(|| Error::NotFound(format!("attack '{}'", kind)))
    }

    /// Every attack, in registry order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Attack> {
        self.slots.iter().map(AttackSlot::as_attack)
    }

    /// Status snapshots, in registry order
    pub fn list(&self) -> Vec<AttackInfo> {
        self.slots.iter().map(AttackSlot::info).collect()
    }

    /// Typed access to the passive capture for its reports
    pub fn passive_capture(&self) -> Option<&PassiveCapture> {
        self.slots.iter().find_map(|s| match s {
            AttackSlot::PassiveCapture(capture) => Some(capture),
            _ => None,
        })
    }

    pub fn passive_capture_mut(&mut self) -> Option<&mut PassiveCapture> {
        self.slots.iter_mut().find_map(|s| match s {
            AttackSlot::PassiveCapture(capture) => Some(capture),
            _ => None,
        })
    }
}
