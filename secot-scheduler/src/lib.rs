//! Attack scheduling for SECoT
//!
//! This crate provides the loop-side infrastructure that drives the
//! attacks. It includes:
//!
//! - `AttackScheduler`: Owns every attack and advances them cooperatively
//! - `AttackSlot`: Closed set of attack instances, one per kind
//! - `AttackInfo`: Serializable status snapshot for front ends
//!
//! # Example
//!
//! ```no_run
//! use secot_core::{AttackKind, SimRadio};
//! use secot_scheduler::AttackScheduler;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scheduler = AttackScheduler::new(Arc::new(SimRadio::new()));
//!     scheduler
//!         .start(AttackKind::BeaconFlood, Duration::from_secs(30))
//!         .await?;
//!
//!     while scheduler.is_any_running() {
//!         scheduler.tick().await;
//!         tokio::time::sleep(Duration::from_millis(1)).await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod registry;
pub mod scheduler;

pub use registry::{AttackInfo, AttackSlot};
pub use scheduler::AttackScheduler;
