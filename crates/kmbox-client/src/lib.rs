//! kmbox-client library entry point.
//!
//! # What does kmbox-client do? (for beginners)
//!
//! A KMBox-Net is a small USB device that sits between a physical mouse and
//! keyboard and the computer they are plugged into.  It can also inject its
//! own mouse and keyboard reports, and it takes orders over UDP from a
//! second machine on the network.  This crate is that second machine's side:
//!
//! 1. [`KmBoxClient::new`] opens a UDP socket to the device.
//! 2. Each command method builds a 16-byte header (device id, nonce, sequence
//!    number, command code), appends an optional payload and waits for the
//!    device to echo the header back.  A matching echo means `Ok(true)`.
//! 3. [`KmBoxClient::create_report_listener`] returns a [`ReportListener`]
//!    that switches the device into monitor mode and hands every physical
//!    input snapshot to a callback.
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use kmbox_client::{ClientConfig, KmBoxClient};
//!
//! # async fn demo() -> Result<(), kmbox_client::ClientError> {
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 2, 188), 8888, "417F0CD3");
//! let client = KmBoxClient::new(config).await?;
//! if client.connect().await? {
//!     client.mouse_move(100, 100).await?;
//! }
//! # Ok(())
//! # }
//! ```

/// Application layer: the dispatcher and multi-command use cases.
pub mod application;

/// The `KmBoxClient` facade.
pub mod client;

pub mod error;

/// Infrastructure layer: UDP sockets and configuration files.
pub mod infrastructure;

pub use application::dispatch::{CommandDispatcher, CommandTransport, Nonce};
pub use application::type_text::DEFAULT_KEY_DELAY;
pub use client::KmBoxClient;
pub use error::ClientError;
pub use infrastructure::network::{ListenerState, ReportCallback, ReportListener, UdpTransport};
pub use infrastructure::storage::config::{ClientConfig, ConfigError};
