//! Rules for re-addressing the device.
//!
//! The firmware only accepts a new address inside its own management subnet,
//! `192.168.2.0/24`.  Anything else would leave the box unreachable.

use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

/// Network address of the subnet the device may be moved within.
pub const DEVICE_SUBNET: Ipv4Addr = Ipv4Addr::new(192, 168, 2, 0);

/// Netmask of [`DEVICE_SUBNET`].
pub const DEVICE_NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigAddressError {
    #[error("device address must be IPv4, got {0}")]
    NotIpv4(IpAddr),

    #[error("device address {0} is outside 192.168.2.0/24")]
    OutsideSubnet(Ipv4Addr),
}

/// Returns `true` if `addr` lies in [`DEVICE_SUBNET`].
pub fn is_in_device_subnet(addr: Ipv4Addr) -> bool {
    let mask = u32::from(DEVICE_NETMASK);
    u32::from(addr) & mask == u32::from(DEVICE_SUBNET) & mask
}

/// Checks that `addr` is an address the device can be moved to.
///
/// # Errors
///
/// Returns [`ConfigAddressError::NotIpv4`] for IPv6 addresses and
/// [`ConfigAddressError::OutsideSubnet`] for IPv4 addresses outside
/// `192.168.2.0/24`.
pub fn validate_config_address(addr: IpAddr) -> Result<Ipv4Addr, ConfigAddressError> {
    let IpAddr::V4(v4) = addr else {
        return Err(ConfigAddressError::NotIpv4(addr));
    };
    if !is_in_device_subnet(v4) {
        return Err(ConfigAddressError::OutsideSubnet(v4));
    }
    Ok(v4)
}
