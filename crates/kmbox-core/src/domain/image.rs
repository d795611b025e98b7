//! LCD image framing.
//!
//! The device has a 128×160 pixel display in RGB565 (two bytes per pixel).
//! A full frame is 40 960 bytes and is uploaded as 40 datagrams of 1024 bytes
//! each.  Line `i` is sent with header nonce `i * 4`.

use thiserror::Error;

use crate::protocol::messages::{ScreenLine, SCREEN_LINE_SIZE};
use crate::protocol::nonce;

pub const SCREEN_WIDTH: usize = 128;
pub const SCREEN_HEIGHT: usize = 160;
pub const BYTES_PER_PIXEL: usize = 2;

/// Size of one full frame in bytes.
pub const SCREEN_IMAGE_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT * BYTES_PER_PIXEL;

/// Number of datagrams a full frame is split into.
pub const SCREEN_LINE_COUNT: usize = SCREEN_IMAGE_SIZE / SCREEN_LINE_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("screen image must be exactly 40960 bytes, got {0}")]
pub struct ImageSizeError(pub usize);

/// A frame buffer that has been checked to be exactly one full frame.
#[derive(Debug, Clone, Copy)]
pub struct ScreenImage<'a> {
    bytes: &'a [u8],
}

impl<'a> ScreenImage<'a> {
    /// Wraps `bytes` after checking its length.
    ///
    /// # Errors
    ///
    /// Returns [`ImageSizeError`] unless `bytes.len() == SCREEN_IMAGE_SIZE`.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ImageSizeError> {
        if bytes.len() != SCREEN_IMAGE_SIZE {
            return Err(ImageSizeError(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// Yields `(nonce, line)` for each of the 40 upload datagrams, in order.
    pub fn lines(&self) -> impl Iterator<Item = (u32, ScreenLine)> + 'a {
        self.bytes
            .chunks_exact(SCREEN_LINE_SIZE)
            .enumerate()
            .map(|(index, chunk)| {
                let mut pixels = [0u8; SCREEN_LINE_SIZE];
                pixels.copy_from_slice(chunk);
                (nonce::screen_line(index as u32), ScreenLine { pixels })
            })
    }
}

/// Packs an 8-bit-per-channel colour into little-endian RGB565.
pub fn rgb565(red: u8, green: u8, blue: u8) -> [u8; 2] {
    let value = (u16::from(red >> 3) << 11) | (u16::from(green >> 2) << 5) | u16::from(blue >> 3);
    value.to_le_bytes()
}

/// Builds a frame filled with a single RGB565 colour.
pub fn solid_frame(pixel: [u8; 2]) -> Vec<u8> {
    pixel
        .iter()
        .copied()
        .cycle()
        .take(SCREEN_IMAGE_SIZE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry() {
        assert_eq!(SCREEN_IMAGE_SIZE, 40_960);
        assert_eq!(SCREEN_LINE_COUNT, 40);
    }

    #[test]
    fn test_new_rejects_wrong_sizes() {
        assert_eq!(
            ScreenImage::new(&[0u8; SCREEN_IMAGE_SIZE - 1]).err(),
            Some(ImageSizeError(SCREEN_IMAGE_SIZE - 1))
        );
        assert!(ScreenImage::new(&vec![0u8; SCREEN_IMAGE_SIZE + 1]).is_err());
        assert!(ScreenImage::new(&[]).is_err());
    }

    #[test]
    fn test_lines_split_frame_in_order_with_nonces() {
        // Arrange – byte value encodes the line index
        let frame: Vec<u8> = (0..SCREEN_IMAGE_SIZE)
            .map(|i| (i / SCREEN_LINE_SIZE) as u8)
            .collect();
        let image = ScreenImage::new(&frame).expect("full frame");

        // Act
        let lines: Vec<(u32, ScreenLine)> = image.lines().collect();

        // Assert
        assert_eq!(lines.len(), SCREEN_LINE_COUNT);
        for (index, (nonce, line)) in lines.iter().enumerate() {
            assert_eq!(*nonce, index as u32 * 4);
            assert!(line.pixels.iter().all(|&b| b == index as u8));
        }
    }

    #[test]
    fn test_rgb565_packs_channels() {
        assert_eq!(rgb565(0xFF, 0x00, 0x00), 0xF800u16.to_le_bytes());
        assert_eq!(rgb565(0x00, 0xFF, 0x00), 0x07E0u16.to_le_bytes());
        assert_eq!(rgb565(0x00, 0x00, 0xFF), 0x001Fu16.to_le_bytes());
    }

    #[test]
    fn test_solid_frame_is_full_size() {
        let frame = solid_frame([0x12, 0x34]);

        assert_eq!(frame.len(), SCREEN_IMAGE_SIZE);
        assert_eq!(&frame[..4], &[0x12, 0x34, 0x12, 0x34]);
    }
}
