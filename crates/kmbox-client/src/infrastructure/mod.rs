//! Infrastructure layer for the client.
//!
//! Contains the I/O adapters: UDP sockets and configuration files.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `kmbox_core`.  Application code reaches sockets only through the
//! `CommandTransport` trait; only its tests use `network::mock` directly.
//!
//! # Sub-modules
//!
//! - **`network`** – the command socket, the monitor report listener and an
//!   in-memory transport for tests.
//!
//! - **`storage`** – TOML configuration files.

pub mod network;
pub mod storage;
