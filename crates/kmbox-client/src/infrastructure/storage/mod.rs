//! Storage infrastructure: device configuration files.
//!
//! The `config` sub-module reads and writes [`config::ClientConfig`] as TOML
//! and validates it before any socket is opened.

pub mod config;
