//! Error types for Tarang

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Tarang error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport could not connect to the destination endpoint
    #[error("Failed to connect to {address}: {reason}")]
    Connect {
        /// Destination endpoint
        address: String,
        /// Transport-reported cause
        reason: String,
    },

    /// Transport is not connected
    #[error("Transport not connected")]
    NotConnected,

    /// Transient transport failure (the loop keeps running)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transport reported that the channel is permanently unusable
    #[error("Transport closed: {0}")]
    TransportClosed(String),

    /// Encoded packet does not have the fixed wire size
    #[error("Invalid packet size: expected {expected} bytes, got {actual}")]
    PacketSize {
        /// Fixed packet size
        expected: usize,
        /// Size actually produced
        actual: usize,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the send loop must stop when this error surfaces from a tick
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::TransportClosed(_) | Error::NotConnected | Error::PacketSize { .. }
        )
    }
}
