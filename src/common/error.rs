//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Formatting error: {0}")]
    Format(#[from] FormatError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// IRC text formatting errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Cannot specify a color above 99 (got {code})")]
    ColorCodeOutOfRange { code: u16 },

    #[error("Unknown color name: {name}")]
    UnknownColorName { name: String },
}

/// Relay dispatch errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Relay not loaded, MessageRelay::load must be called first")]
    NotLoaded,

    #[error("Discord channel {channel_id} could not be resolved")]
    ChannelNotFound { channel_id: u64 },

    #[error("Discord channel {channel_id} is not a messageable channel")]
    ChannelNotMessageable { channel_id: u64 },
}

/// Transport failure reported by a gateway implementation.
///
/// The relay treats these as best-effort losses: the failure is logged and
/// processing continues with the remaining lines and events.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Network send failed: {message}")]
    Network { message: String },

    #[error("Transport closed")]
    Closed,
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Result type alias for formatting operations.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Result type alias for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;
