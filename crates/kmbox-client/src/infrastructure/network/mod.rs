//! Network infrastructure for the client.
//!
//! - `udp` – the connected command socket implementing `CommandTransport`.
//! - `monitor` – the report listener bound to `command port + 1`.
//! - `mock` – an in-memory transport that records requests, for tests.

pub mod mock;
pub mod monitor;
pub mod udp;

pub use monitor::{ListenerState, ReportCallback, ReportListener};
pub use udp::UdpTransport;
