//! Error type shared by every client operation.
//!
//! A rejected exchange (reply does not correlate) is not an error; operations
//! report it as `Ok(false)`.

use std::net::SocketAddr;
use std::time::Duration;

use kmbox_core::{ConfigAddressError, ImageSizeError, ProtocolError};
use thiserror::Error;

use crate::infrastructure::storage::config::ConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Send or receive failed on an open socket.
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No reply arrived within the configured response timeout.
    #[error("no reply from device within {0:?}")]
    Timeout(Duration),

    /// The reply datagram could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid client configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid device address: {0}")]
    ConfigAddress(#[from] ConfigAddressError),

    #[error("invalid screen image: {0}")]
    ImageSize(#[from] ImageSizeError),

    #[error("character {character:?} at index {index} cannot be typed")]
    UnsupportedCharacter { character: char, index: usize },

    #[error("at most {max} keys can be held at once, got {count}")]
    TooManyKeys { count: usize, max: usize },

    /// A report listener on this client has not been stopped yet.
    #[error("a report listener is already active on this client")]
    ListenerActive,

    #[error("report listener has already been started")]
    ListenerAlreadyStarted,
}
