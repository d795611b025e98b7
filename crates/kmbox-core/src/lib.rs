//! # kmbox-core
//!
//! Shared library for talking to a KMBox-Net device: the UDP wire codec,
//! command codes, header nonce rules, HID key tables and device rules.
//!
//! It has no sockets and no async runtime; the client crate owns all I/O.
//!
//! # Architecture overview (for beginners)
//!
//! A KMBox-Net is a small USB box that sits between a PC and its mouse and
//! keyboard.  Over Ethernet it accepts commands that inject input, mask the
//! physical devices, or draw on its LCD.  It can also stream what the
//! physical mouse and keyboard are doing.
//!
//! - **`protocol`** – how bytes travel.  Every command is a 16-byte header plus
//!   an optional fixed-size payload, all little-endian.
//!
//! - **`keymap`** – USB HID key usage ids and a US-layout table that maps
//!   characters to keystrokes.
//!
//! - **`domain`** – rules with no I/O: parsing the device UUID, limiting the
//!   addresses the device may be moved to, and splitting an LCD frame into
//!   upload lines.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::{ConfigAddressError, DeviceId, DeviceIdError, ImageSizeError, ScreenImage};
pub use keymap::hid::HidKeyCode;
pub use protocol::codec::{decode, encode_header, encode_packet, ProtocolError, WireFormat};
pub use protocol::messages::{CommandCode, CommandHeader, CompositeReport};
