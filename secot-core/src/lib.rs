//! SECoT Core Library
//!
//! This crate provides the fundamental traits, types, and error handling
//! for the SECoT radio attack engine: the attack lifecycle, option schemas,
//! the radio boundary and an in-memory radio for host runs.

pub mod attack;
pub mod config;
pub mod error;
pub mod parameter;
pub mod radio;
pub mod sim;
pub mod types;

// Re-export commonly used types
pub use attack::{Attack, AttackState, AttackStats, AttackStatus};
pub use error::{Error, Result};
pub use parameter::{Access, OptionInfo, OptionSpec, ParameterMap, ParameterType};
pub use radio::{AccessPoint, FrameSink, Radio, RadioMode, RxMeta};
pub use sim::{SentFrame, SimRadio};
pub use types::*;
