//! Header nonce values for commands that use the nonce as a parameter.
//!
//! Most commands send a random nonce.  The helpers here build the nonce for
//! the handful that carry data in it instead.

use std::net::Ipv4Addr;

use crate::keymap::hid::HidKeyCode;

/// Upper 16 bits of the monitor-enable nonce.
pub const MONITOR_MAGIC: u32 = 0xAA55;

/// Nonce that enables monitor mode and tells the device which port to stream to.
pub fn monitor_enable(listen_port: u16) -> u32 {
    u32::from(listen_port) | (MONITOR_MAGIC << 16)
}

/// Nonce that disables monitor mode.
pub const MONITOR_DISABLE: u32 = 0;

/// Extracts the listen port from a monitor-enable nonce.
///
/// Returns `None` for the disable nonce or any value without the magic prefix.
pub fn monitor_port(nonce: u32) -> Option<u16> {
    if nonce >> 16 == MONITOR_MAGIC {
        Some((nonce & 0xFFFF) as u16)
    } else {
        None
    }
}

/// Nonce carrying a new device address for the set-config command.
///
/// The four octets are packed little-endian, so `192.168.2.188` becomes
/// `0xBC02A8C0`.
pub fn config_address(addr: Ipv4Addr) -> u32 {
    u32::from_le_bytes(addr.octets())
}

/// Nonce that masks one physical keyboard key.
pub fn keyboard_mask(key: HidKeyCode) -> u32 {
    u32::from(key.as_u8()) << 8
}

/// Nonce for line `index` of an LCD image upload.
pub fn screen_line(index: u32) -> u32 {
    index * 4
}
