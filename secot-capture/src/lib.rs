//! Passive capture library for SECoT
//!
//! This crate turns the frames a promiscuous radio hands over into a
//! picture of the surrounding network.
//!
//! ## Features
//!
//! - **Capture Tap**: Classifies frames in the radio's context and queues them
//! - **Class Filters**: Live toggles for beacons, probes, data, management and control
//! - **Device Table**: Bounded table of stations and access points
//! - **Packet History**: Ring of the most recent frames
//! - **Statistics**: Per-class counters and queue overflows
//!
//! ## Example
//!
//! ```no_run
//! use secot_capture::PassiveCapture;
//! use secot_core::{Attack, SimRadio};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> secot_core::Result<()> {
//! let mut capture = PassiveCapture::new(Arc::new(SimRadio::new()));
//! capture.set_parameter("hopinterval", "250")?;
//! capture.start(Duration::from_secs(60)).await?;
//!
//! // Drive it from the main loop
//! capture.update().await;
//! println!("{}", capture.get_parameter("devices")?);
//! # Ok(())
//! # }
//! ```

pub mod filters;
pub mod passive;
pub mod stats;
pub mod tables;
pub mod tap;

// Re-export main types
pub use filters::{CaptureClass, CaptureSwitches};
pub use passive::{PassiveCapture, PassiveCaptureConfig};
pub use stats::{CaptureCounters, ClassCounters, TapCounters};
pub use tables::{CaptureTables, DeviceTable, PacketRing, Sighting, SniffedDevice, SniffedPacket};
pub use tap::{CaptureTap, CapturedFrame};
