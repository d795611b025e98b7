//! Binary codec for the KMBox wire format.
//!
//! Wire format of a command datagram:
//! ```text
//! [device_id:4][nonce:4][sequence:4][command:4][payload:N]
//! ```
//! The header is 16 bytes.  All multi-byte integers are little-endian, with
//! one exception: the port in [`SetConfigPayload`] is sent high byte first.
//!
//! Payloads are fixed-size, so there is no length prefix.  The device replies
//! with a bare 16-byte header.

use thiserror::Error;

use crate::protocol::messages::{
    CommandHeader, CompositeReport, KeyboardAction, KeyboardModifiers, KeyboardReport,
    MouseAction, MouseButtons, MouseReport, ScreenLine, SetConfigPayload, COMPOSITE_REPORT_SIZE,
    HEADER_SIZE, KEYBOARD_ACTION_SIZE, KEYBOARD_REPORT_SIZE, KEY_SLOT_COUNT, MOUSE_ACTION_SIZE,
    MOUSE_POINT_COUNT, MOUSE_REPORT_SIZE, SCREEN_LINE_SIZE, SET_CONFIG_SIZE,
};

/// Errors that can occur while decoding a datagram.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the fixed layout requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },
}

// ── Wire traits ───────────────────────────────────────────────────────────────

/// A fixed-size value with a defined byte layout.
///
/// Decoding reads exactly [`WireFormat::WIRE_SIZE`] bytes from the front of the
/// buffer and ignores anything after them.
pub trait WireFormat: Sized {
    /// Number of bytes this value occupies on the wire.
    const WIRE_SIZE: usize;

    /// Appends the wire representation to `buf`.
    fn write_to(&self, buf: &mut Vec<u8>);

    /// Reads the value from the current reader position.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if the reader runs dry.
    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError>;
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a header into its 16-byte wire form.
///
/// # Examples
///
/// ```rust
/// use kmbox_core::protocol::{encode_header, CommandCode, CommandHeader};
///
/// let header = CommandHeader::new(0x417F_0CD3, 0, 1, CommandCode::Connect);
/// let bytes = encode_header(&header);
/// assert_eq!(&bytes[0..4], &[0xD3, 0x0C, 0x7F, 0x41]);
/// assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
/// ```
pub fn encode_header(header: &CommandHeader) -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];
    out[0..4].copy_from_slice(&header.device_id.to_le_bytes());
    out[4..8].copy_from_slice(&header.nonce.to_le_bytes());
    out[8..12].copy_from_slice(&header.sequence.to_le_bytes());
    out[12..16].copy_from_slice(&header.command.to_le_bytes());
    out
}

/// Encodes a header followed by one payload into a single datagram.
pub fn encode_packet<P: WireFormat>(header: &CommandHeader, payload: &P) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + P::WIRE_SIZE);
    buf.extend_from_slice(&encode_header(header));
    payload.write_to(&mut buf);
    buf
}

/// Encodes any wire value on its own.
pub fn encode<T: WireFormat>(value: &T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(T::WIRE_SIZE);
    value.write_to(&mut buf);
    buf
}

/// Decodes a value from the beginning of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if `bytes` is shorter than
/// `T::WIRE_SIZE`.
///
/// # Examples
///
/// ```rust
/// use kmbox_core::protocol::{decode, CommandHeader, ProtocolError};
///
/// let err = decode::<CommandHeader>(&[0u8; 15]).unwrap_err();
/// assert_eq!(err, ProtocolError::InsufficientData { needed: 16, available: 15 });
/// ```
pub fn decode<T: WireFormat>(bytes: &[u8]) -> Result<T, ProtocolError> {
    if bytes.len() < T::WIRE_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: T::WIRE_SIZE,
            available: bytes.len(),
        });
    }
    T::read_from(&mut WireReader::new(bytes))
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Forward-only cursor over a received datagram.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let end = self.pos + N;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or(ProtocolError::InsufficientData {
                needed: end,
                available: self.buf.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, ProtocolError> {
        self.take().map(u16::from_be_bytes)
    }

    pub fn read_i16_le(&mut self) -> Result<i16, ProtocolError> {
        self.take().map(i16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ProtocolError> {
        self.take().map(u32::from_le_bytes)
    }

    pub fn read_i32_le(&mut self) -> Result<i32, ProtocolError> {
        self.take().map(i32::from_le_bytes)
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        self.take()
    }
}

// ── Layouts ───────────────────────────────────────────────────────────────────

impl WireFormat for CommandHeader {
    const WIRE_SIZE: usize = HEADER_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&encode_header(self));
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            device_id: reader.read_u32_le()?,
            nonce: reader.read_u32_le()?,
            sequence: reader.read_u32_le()?,
            command: reader.read_u32_le()?,
        })
    }
}

impl WireFormat for MouseAction {
    const WIRE_SIZE: usize = MOUSE_ACTION_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        // buttons is a signed int in the firmware struct; the bit pattern is identical
        buf.extend_from_slice(&self.buttons.0.to_le_bytes());
        buf.extend_from_slice(&self.x.to_le_bytes());
        buf.extend_from_slice(&self.y.to_le_bytes());
        buf.extend_from_slice(&self.wheel.to_le_bytes());
        for point in &self.points {
            buf.extend_from_slice(&point.to_le_bytes());
        }
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let buttons = MouseButtons(reader.read_u32_le()?);
        let x = reader.read_i32_le()?;
        let y = reader.read_i32_le()?;
        let wheel = reader.read_i32_le()?;
        let mut points = [0i32; MOUSE_POINT_COUNT];
        for point in points.iter_mut() {
            *point = reader.read_i32_le()?;
        }
        Ok(Self {
            buttons,
            x,
            y,
            wheel,
            points,
        })
    }
}

impl WireFormat for KeyboardAction {
    const WIRE_SIZE: usize = KEYBOARD_ACTION_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.modifiers.0);
        buf.push(self.reserved);
        buf.extend_from_slice(&self.keys);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            modifiers: KeyboardModifiers(reader.read_u8()?),
            reserved: reader.read_u8()?,
            keys: reader.read_bytes::<KEY_SLOT_COUNT>()?,
        })
    }
}

impl WireFormat for SetConfigPayload {
    const WIRE_SIZE: usize = SET_CONFIG_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        // the firmware reads the port high byte first, unlike every other field
        buf.extend_from_slice(&self.port.to_be_bytes());
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            port: reader.read_u16_be()?,
        })
    }
}

impl WireFormat for ScreenLine {
    const WIRE_SIZE: usize = SCREEN_LINE_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.pixels);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            pixels: reader.read_bytes::<SCREEN_LINE_SIZE>()?,
        })
    }
}

impl WireFormat for MouseReport {
    const WIRE_SIZE: usize = MOUSE_REPORT_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.report_id);
        buf.push(self.buttons);
        buf.extend_from_slice(&self.x.to_le_bytes());
        buf.extend_from_slice(&self.y.to_le_bytes());
        buf.extend_from_slice(&self.wheel.to_le_bytes());
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            report_id: reader.read_u8()?,
            buttons: reader.read_u8()?,
            x: reader.read_i16_le()?,
            y: reader.read_i16_le()?,
            wheel: reader.read_i16_le()?,
        })
    }
}

impl WireFormat for KeyboardReport {
    const WIRE_SIZE: usize = KEYBOARD_REPORT_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.report_id);
        buf.push(self.modifiers.0);
        buf.extend_from_slice(&self.keys);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            report_id: reader.read_u8()?,
            modifiers: KeyboardModifiers(reader.read_u8()?),
            keys: reader.read_bytes::<KEY_SLOT_COUNT>()?,
        })
    }
}

impl WireFormat for CompositeReport {
    const WIRE_SIZE: usize = COMPOSITE_REPORT_SIZE;

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.mouse.write_to(buf);
        self.keyboard.write_to(buf);
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            mouse: MouseReport::read_from(reader)?,
            keyboard: KeyboardReport::read_from(reader)?,
        })
    }
}
