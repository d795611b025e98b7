//! Key vocabulary for the device.
//!
//! The device speaks USB HID usage ids ([`hid`]).  Text is turned into key
//! presses through a fixed US-layout table ([`text`]).

pub mod hid;
pub mod text;

pub use hid::HidKeyCode;
pub use text::{lookup, KeyStroke};
