//! Attack traits and lifecycle state
//!
//! Every attack is driven the same way: `start()` validates and configures
//! the radio, `update()` is called once per scheduler tick, and `stop()`
//! releases what `start()` acquired. The lifecycle itself lives in the
//! provided methods of [`Attack`]; implementations only fill in the hooks.

use crate::parameter::{OptionInfo, ParameterMap};
use crate::{AttackKind, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Attack status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttackStatus {
    Idle,
    Running,
    Stopping,
    Error,
}

impl AttackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackStatus::Idle => "IDLE",
            AttackStatus::Running => "RUNNING",
            AttackStatus::Stopping => "STOPPING",
            AttackStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attack statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttackStats {
    /// Frames handed to the radio
    pub frames_sent: u64,
    /// Bytes handed to the radio
    pub bytes_sent: u64,
    /// Transmissions the radio refused
    pub tx_errors: u64,
    /// When the current or last run started
    #[serde(skip)]
    pub started_at: Option<Instant>,
    /// Is the attack currently running?
    pub is_running: bool,
}

/// Lifecycle bookkeeping shared by every attack
#[derive(Debug, Clone)]
pub struct AttackState {
    status: AttackStatus,
    last_error: Option<String>,
    started_at: Option<Instant>,
    duration: Duration,
    last_action: Option<Instant>,
    run_id: Option<Uuid>,
    frames_sent: u64,
    bytes_sent: u64,
    tx_errors: u64,
}

impl AttackState {
    pub fn new() -> Self {
        Self {
            status: AttackStatus::Idle,
            last_error: None,
            started_at: None,
            duration: Duration::ZERO,
            last_action: None,
            run_id: None,
            frames_sent: 0,
            bytes_sent: 0,
            tx_errors: 0,
        }
    }

    pub fn status(&self) -> AttackStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == AttackStatus::Running
    }

    /// Last recorded failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time-ordered id of the current or last run
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Requested duration, zero when unbounded
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Enter Running: record the start instant and reset timers and counters
    pub fn mark_running(&mut self, duration: Duration) -> Uuid {
        let id = Uuid::now_v7();
        self.started_at = Some(Instant::now());
        self.duration = duration;
        self.last_action = None;
        self.run_id = Some(id);
        self.frames_sent = 0;
        self.bytes_sent = 0;
        self.tx_errors = 0;
        self.status = AttackStatus::Running;
        id
    }

    pub fn mark_stopping(&mut self) {
        self.status = AttackStatus::Stopping;
    }

    /// Record a failure and move to Error
    pub fn fail(&mut self, error: &Error) {
        self.last_error = Some(error.to_string());
        self.status = AttackStatus::Error;
    }

    /// Record a failure without changing status
    pub fn record_error(&mut self, error: &Error) {
        self.last_error = Some(error.to_string());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// A bounded run has reached its requested duration
    pub fn duration_elapsed(&self) -> bool {
        match self.started_at {
            Some(started) if !self.duration.is_zero() => started.elapsed() >= self.duration,
            _ => false,
        }
    }

    /// Returns true (and restarts the action timer) once `interval` has
    /// passed since the last action; the first call of a run always fires.
    pub fn action_due(&mut self, interval: Duration) -> bool {
        let now = Instant::now();
        let due = match self.last_action {
            None => true,
            Some(last) => now.duration_since(last) >= interval,
        };
        if due {
            self.last_action = Some(now);
        }
        due
    }

    /// Account for one transmission attempt
    pub fn record_tx(&mut self, outcome: &Result<()>, len: usize) {
        match outcome {
            Ok(()) => {
                self.frames_sent += 1;
                self.bytes_sent += len as u64;
            }
            Err(_) => self.tx_errors += 1,
        }
    }

    pub fn stats(&self) -> AttackStats {
        AttackStats {
            frames_sent: self.frames_sent,
            bytes_sent: self.bytes_sent,
            tx_errors: self.tx_errors,
            started_at: self.started_at,
            is_running: self.is_running(),
        }
    }
}

impl Default for AttackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Attack trait that all attacks must implement
///
/// Implementors provide the hooks (`on_start`, `on_stop`, `on_tick`) and
/// the option schema accessors. The provided `start`, `stop` and `update`
/// methods implement the shared state machine:
///
/// `Idle -> Running -> Stopping -> Idle`, with `Error` reachable from a
/// failed `start()`.
#[async_trait]
pub trait Attack: Send + Sync {
    /// Attack kind
    fn kind(&self) -> AttackKind;

    /// Display name
    fn name(&self) -> &'static str;

    fn state(&self) -> &AttackState;

    fn state_mut(&mut self) -> &mut AttackState;

    /// Validate preconditions and configure the radio
    async fn on_start(&mut self) -> Result<()>;

    /// Release the radio state acquired in `on_start`
    async fn on_stop(&mut self);

    /// Periodic work while Running
    async fn on_tick(&mut self);

    /// Apply one option through the attack's schema
    fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()>;

    /// Read one option through the attack's schema
    fn read_parameter(&self, name: &str) -> Result<String>;

    /// Every readable and settable option, in schema order
    fn parameters(&self) -> ParameterMap;

    /// The option schema: names, types, access and descriptions
    fn options(&self) -> Vec<OptionInfo>;

    /// Start the attack
    ///
    /// A no-op when already Running. On failure the attack moves to Error
    /// and the failure is both recorded and returned.
    async fn start(&mut self, duration: Duration) -> Result<()> {
        if self.state().is_running() {
            return Ok(());
        }
        self.state_mut().clear_error();

        if let Err(e) = self.on_start().await {
            warn!(attack = %self.kind(), error = %e, "Attack failed to start");
            self.state_mut().fail(&e);
            return Err(e);
        }

        let run_id = self.state_mut().mark_running(duration);
        info!(
            attack = %self.kind(),
            run_id = %run_id,
            duration_ms = duration.as_millis() as u64,
            "Attack started"
        );
        Ok(())
    }

    /// Stop the attack; a no-op unless Running
    async fn stop(&mut self) -> Result<()> {
        if !self.state().is_running() {
            return Ok(());
        }
        self.on_stop().await;
        self.state_mut().mark_stopping();
        info!(
            attack = %self.kind(),
            run_id = ?self.state().run_id(),
            "Attack stopped"
        );
        Ok(())
    }

    /// Advance the attack by one scheduler tick
    async fn update(&mut self) {
        if self.state().is_running() && self.state().duration_elapsed() {
            info!(attack = %self.kind(), "Attack duration elapsed");
            if let Err(e) = self.stop().await {
                warn!(attack = %self.kind(), error = %e, "Failed to stop attack");
            }
        }

        if self.state().status() == AttackStatus::Stopping {
            self.state_mut().status = AttackStatus::Idle;
        }

        if self.state().is_running() {
            self.on_tick().await;
        }
    }

    /// Set an option; failures are also recorded as the last error
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        let result = self.apply_parameter(name, value);
        if let Err(e) = &result {
            self.state_mut().record_error(e);
        }
        result
    }

    /// Read an option; secrets are redacted
    fn get_parameter(&self, name: &str) -> Result<String> {
        self.read_parameter(name)
    }

    fn status(&self) -> AttackStatus {
        self.state().status()
    }

    fn last_error(&self) -> Option<&str> {
        self.state().last_error()
    }

    fn stats(&self) -> AttackStats {
        self.state().stats()
    }

    fn is_running(&self) -> bool {
        self.state().is_running()
    }
}
