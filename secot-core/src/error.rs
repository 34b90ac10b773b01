//! Error types for SECoT

use thiserror::Error;

/// Result type alias for SECoT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for SECoT
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Parameter name not known to the attack
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Parameter can be read but not written
    #[error("Parameter '{0}' is read-only")]
    ReadOnlyParameter(String),

    /// Missing or inconsistent attack configuration
    #[error("{0}")]
    Configuration(String),

    /// Target address could not be resolved
    #[error("{0}")]
    Discovery(String),

    /// Radio driver error
    #[error("Radio error: {0}")]
    Radio(String),

    /// Frame transmission error
    #[error("Transmission failed: {0}")]
    Transmission(String),

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Capture error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a discovery error
    pub fn discovery<S: Into<String>>(msg: S) -> Self {
        Error::Discovery(msg.into())
    }

    /// Create a radio error
    pub fn radio<S: Into<String>>(msg: S) -> Self {
        Error::Radio(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_facing_messages() {
        assert_eq!(
            Error::discovery("Target AP not found").to_string(),
            "Target AP not found"
        );
        assert_eq!(
            Error::invalid_parameter("channel", "must be 1-14").to_string(),
            "Invalid parameter 'channel': must be 1-14"
        );
        assert_eq!(
            Error::UnknownParameter("foo".into()).to_string(),
            "Unknown parameter: foo"
        );
    }
}
