//! Device identifier parsing.
//!
//! Each box is labelled with an 8-hex-digit UUID such as `417F0CD3`.  The
//! first header field of every command is that UUID read as four bytes and
//! packed most-significant-first into a `u32`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of hex digits in a device UUID.
pub const DEVICE_UUID_LEN: usize = 8;

/// Errors produced while parsing a device UUID.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceIdError {
    #[error("device uuid must be 8 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex digit {digit:?} at position {position} in device uuid")]
    InvalidDigit { digit: char, position: usize },
}

/// The 32-bit device identifier carried in every [`CommandHeader`].
///
/// [`CommandHeader`]: crate::protocol::messages::CommandHeader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Parses an 8-hex-digit device UUID, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceIdError`] if the string is not exactly eight ASCII hex
    /// digits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kmbox_core::domain::DeviceId;
    ///
    /// let id = DeviceId::parse("417f0cd3").unwrap();
    /// assert_eq!(id.as_u32(), 0x417F_0CD3);
    /// ```
    pub fn parse(uuid: &str) -> Result<Self, DeviceIdError> {
        let char_count = uuid.chars().count();
        if char_count != DEVICE_UUID_LEN {
            return Err(DeviceIdError::InvalidLength(char_count));
        }

        let mut value = 0u32;
        for (position, digit) in uuid.chars().enumerate() {
            let nibble = digit
                .to_digit(16)
                .ok_or(DeviceIdError::InvalidDigit { digit, position })?;
            value = (value << 4) | nibble;
        }
        Ok(Self(value))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DeviceId> for u32 {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_packs_bytes_most_significant_first() {
        let id = DeviceId::parse("01020304").expect("valid uuid");

        assert_eq!(id.as_u32(), 0x0102_0304);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower = DeviceId::parse("abcdef12").expect("valid uuid");
        let upper = DeviceId::parse("ABCDEF12").expect("valid uuid");
        let mixed = DeviceId::parse("aBcDeF12").expect("valid uuid");

        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
        assert_eq!(lower.as_u32(), 0xABCD_EF12);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(DeviceId::parse("1234567"), Err(DeviceIdError::InvalidLength(7)));
        assert_eq!(DeviceId::parse("123456789"), Err(DeviceIdError::InvalidLength(9)));
        assert_eq!(DeviceId::parse(""), Err(DeviceIdError::InvalidLength(0)));
    }

    #[test]
    fn test_parse_rejects_non_hex_digit() {
        assert_eq!(
            DeviceId::parse("1234567G"),
            Err(DeviceIdError::InvalidDigit {
                digit: 'G',
                position: 7
            })
        );
    }

    #[test]
    fn test_parse_rejects_multibyte_characters() {
        assert!(matches!(
            DeviceId::parse("1234567é"),
            Err(DeviceIdError::InvalidDigit { position: 7, .. })
        ));
    }

    #[test]
    fn test_display_is_uppercase_hex() {
        let id: DeviceId = "0000beef".parse().expect("valid uuid");

        assert_eq!(id.to_string(), "0000BEEF");
    }
}
