//! Device rules with no I/O: identifier parsing, re-addressing limits and LCD
//! frame framing.

pub mod device_config;
pub mod device_id;
pub mod image;

pub use device_config::{validate_config_address, ConfigAddressError};
pub use device_id::{DeviceId, DeviceIdError};
pub use image::{ImageSizeError, ScreenImage};
