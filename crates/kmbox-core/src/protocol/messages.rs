//! All KMBox protocol message types.
//!
//! Every datagram sent to the device is a 16-byte [`CommandHeader`] optionally
//! followed by exactly one fixed-size payload.  The device acknowledges by
//! echoing the header back.  While monitor mode is active the device also
//! streams [`CompositeReport`]s to a second UDP port.
//!
//! The structs here are plain data.  Their byte layouts live in
//! [`crate::protocol::codec`].

use serde::{Deserialize, Serialize};

use crate::keymap::hid::HidKeyCode;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of [`CommandHeader`] on the wire.
pub const HEADER_SIZE: usize = 16;

/// Size of [`MouseAction`] on the wire: 4 × i32 + 10 × i32.
pub const MOUSE_ACTION_SIZE: usize = 56;

/// Size of [`KeyboardAction`] on the wire.
pub const KEYBOARD_ACTION_SIZE: usize = 12;

/// Size of [`SetConfigPayload`] on the wire.
pub const SET_CONFIG_SIZE: usize = 2;

/// Size of one [`ScreenLine`] on the wire.
pub const SCREEN_LINE_SIZE: usize = 1024;

/// Size of [`MouseReport`] on the wire.
pub const MOUSE_REPORT_SIZE: usize = 8;

/// Size of [`KeyboardReport`] on the wire.
pub const KEYBOARD_REPORT_SIZE: usize = 12;

/// Size of [`CompositeReport`] on the wire.
pub const COMPOSITE_REPORT_SIZE: usize = MOUSE_REPORT_SIZE + KEYBOARD_REPORT_SIZE;

/// Number of auxiliary integers carried by [`MouseAction::points`].
pub const MOUSE_POINT_COUNT: usize = 10;

/// Number of simultaneously pressed keys a keyboard payload or report can hold.
pub const KEY_SLOT_COUNT: usize = 10;

// ── Command codes ─────────────────────────────────────────────────────────────

/// Command codes understood by the device firmware.
///
/// The values are fixed by the firmware and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum CommandCode {
    /// Handshake sent once after the socket is connected.
    Connect = 0xAF3C_2828,
    /// Instant relative mouse move.
    MouseMove = 0xAEDE_7345,
    /// Mouse button state.  Middle and right clicks are also sent with this code.
    MouseLeft = 0x9823_AE8D,
    MouseMiddle = 0x97A3_AE8D,
    MouseRight = 0x238D_8212,
    /// Mouse wheel scroll.
    MouseWheel = 0xFFEE_AD38,
    /// Interpolated move; the header nonce carries the duration in milliseconds.
    MouseAutoMove = 0xAEDE_7346,
    /// Full keyboard state (modifiers plus up to 10 keys).
    KeyboardAll = 0x123C_2C2F,
    Reboot = 0xAA88_55AA,
    /// Bézier-curve move; the header nonce carries the duration in milliseconds.
    BezierMove = 0xA238_455A,
    /// Enables or disables monitor mode; see [`crate::protocol::nonce::monitor_enable`].
    Monitor = 0x2738_8020,
    /// Present in the firmware, never sent by this client.
    Debug = 0x2738_2021,
    Mask = 0x2323_4343,
    UnmaskAll = 0x2334_4343,
    SetConfig = 0x1D3D_3323,
    ShowPicture = 0x1233_4883,
}

impl CommandCode {
    /// Every command code, in declaration order.
    pub const ALL: [CommandCode; 16] = [
        CommandCode::Connect,
        CommandCode::MouseMove,
        CommandCode::MouseLeft,
        CommandCode::MouseMiddle,
        CommandCode::MouseRight,
        CommandCode::MouseWheel,
        CommandCode::MouseAutoMove,
        CommandCode::KeyboardAll,
        CommandCode::Reboot,
        CommandCode::BezierMove,
        CommandCode::Monitor,
        CommandCode::Debug,
        CommandCode::Mask,
        CommandCode::UnmaskAll,
        CommandCode::SetConfig,
        CommandCode::ShowPicture,
    ];

    /// Returns the raw 32-bit value transmitted in the header.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for CommandCode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        CommandCode::ALL
            .into_iter()
            .find(|code| code.as_u32() == value)
            .ok_or(value)
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

/// 16-byte preamble of every command and of every device acknowledgement.
///
/// `command` is kept as the raw wire value so that a reply carrying an
/// unrecognised code still decodes and simply fails correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandHeader {
    /// Device identifier derived from the 8-hex-digit UUID printed on the box.
    pub device_id: u32,
    /// Random by default; some commands use it to carry a value.
    pub nonce: u32,
    /// Per-client request counter used to match the reply.
    pub sequence: u32,
    /// Raw [`CommandCode`] value.
    pub command: u32,
}

impl CommandHeader {
    pub fn new(device_id: u32, nonce: u32, sequence: u32, command: CommandCode) -> Self {
        Self {
            device_id,
            nonce,
            sequence,
            command: command.as_u32(),
        }
    }

    /// Returns the typed command code, or `None` for values the firmware table
    /// does not define.
    pub fn command_code(&self) -> Option<CommandCode> {
        CommandCode::try_from(self.command).ok()
    }

    /// Returns `true` if `reply` acknowledges this request.
    ///
    /// The device echoes the request header; a reply is accepted when both the
    /// command code and the sequence number match.  The device id and nonce are
    /// not compared.
    pub fn is_acknowledged_by(&self, reply: &CommandHeader) -> bool {
        self.command == reply.command && self.sequence == reply.sequence
    }
}

// ── Bit flags ─────────────────────────────────────────────────────────────────

/// Mouse button bitmask used in [`MouseAction::buttons`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MouseButtons(pub u32);

impl MouseButtons {
    pub const NONE: MouseButtons = MouseButtons(0);
    pub const LEFT: MouseButtons = MouseButtons(1 << 0);
    pub const RIGHT: MouseButtons = MouseButtons(1 << 1);
    pub const MIDDLE: MouseButtons = MouseButtons(1 << 2);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: MouseButtons) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MouseButtons {
    type Output = MouseButtons;

    fn bitor(self, rhs: Self) -> Self::Output {
        MouseButtons(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MouseButtons {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Keyboard modifier bitmask (the standard USB HID boot-keyboard modifier byte).
///
/// Bit layout:
/// - Bit 0: Left Ctrl
/// - Bit 1: Left Shift
/// - Bit 2: Left Alt
/// - Bit 3: Left GUI (Windows/Command/Super)
/// - Bit 4: Right Ctrl
/// - Bit 5: Right Shift
/// - Bit 6: Right Alt
/// - Bit 7: Right GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct KeyboardModifiers(pub u8);

impl KeyboardModifiers {
    pub const NONE: KeyboardModifiers = KeyboardModifiers(0);
    pub const LEFT_CTRL: KeyboardModifiers = KeyboardModifiers(1 << 0);
    pub const LEFT_SHIFT: KeyboardModifiers = KeyboardModifiers(1 << 1);
    pub const LEFT_ALT: KeyboardModifiers = KeyboardModifiers(1 << 2);
    pub const LEFT_GUI: KeyboardModifiers = KeyboardModifiers(1 << 3);
    pub const RIGHT_CTRL: KeyboardModifiers = KeyboardModifiers(1 << 4);
    pub const RIGHT_SHIFT: KeyboardModifiers = KeyboardModifiers(1 << 5);
    pub const RIGHT_ALT: KeyboardModifiers = KeyboardModifiers(1 << 6);
    pub const RIGHT_GUI: KeyboardModifiers = KeyboardModifiers(1 << 7);

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(self) -> bool {
        self.0 & (Self::LEFT_CTRL.0 | Self::RIGHT_CTRL.0) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT.0 | Self::RIGHT_SHIFT.0) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(self) -> bool {
        self.0 & (Self::LEFT_ALT.0 | Self::RIGHT_ALT.0) != 0
    }

    /// Returns `true` if either GUI modifier is active.
    pub fn gui(self) -> bool {
        self.0 & (Self::LEFT_GUI.0 | Self::RIGHT_GUI.0) != 0
    }
}

impl std::ops::BitOr for KeyboardModifiers {
    type Output = KeyboardModifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        KeyboardModifiers(self.0 | rhs.0)
    }
}

/// Inputs the device can suppress from the physically attached mouse.
///
/// Sent in the header nonce of a [`CommandCode::Mask`] command.  Masks combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MouseMasks(pub u32);

impl MouseMasks {
    pub const LEFT: MouseMasks = MouseMasks(1 << 0);
    pub const RIGHT: MouseMasks = MouseMasks(1 << 1);
    pub const MIDDLE: MouseMasks = MouseMasks(1 << 2);
    pub const SIDE1: MouseMasks = MouseMasks(1 << 3);
    pub const SIDE2: MouseMasks = MouseMasks(1 << 4);
    pub const X_MOVEMENT: MouseMasks = MouseMasks(1 << 5);
    pub const Y_MOVEMENT: MouseMasks = MouseMasks(1 << 6);
    pub const WHEEL: MouseMasks = MouseMasks(1 << 7);
}

impl std::ops::BitOr for MouseMasks {
    type Output = MouseMasks;

    fn bitor(self, rhs: Self) -> Self::Output {
        MouseMasks(self.0 | rhs.0)
    }
}

// ── Outbound payloads ─────────────────────────────────────────────────────────

/// Mouse payload shared by all mouse commands.
///
/// `points` is interpreted per command: Bézier moves put the two control points
/// in `points[0..4]`, every other command leaves it zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseAction {
    pub buttons: MouseButtons,
    /// Relative X movement.
    pub x: i32,
    /// Relative Y movement.
    pub y: i32,
    pub wheel: i32,
    pub points: [i32; MOUSE_POINT_COUNT],
}

impl MouseAction {
    /// A relative move with no buttons held.
    pub fn movement(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// Keyboard payload: the complete set of keys the device should hold down.
///
/// An all-zero payload releases everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardAction {
    pub modifiers: KeyboardModifiers,
    /// Unused by the firmware; always sent as zero.
    pub reserved: u8,
    /// HID usage ids; 0 marks an empty slot.
    pub keys: [u8; KEY_SLOT_COUNT],
}

impl KeyboardAction {
    /// Holds a single key with the given modifiers.
    pub fn single(key: HidKeyCode, modifiers: KeyboardModifiers) -> Self {
        let mut keys = [0u8; KEY_SLOT_COUNT];
        keys[0] = key.as_u8();
        Self {
            modifiers,
            reserved: 0,
            keys,
        }
    }

    /// Holds up to [`KEY_SLOT_COUNT`] keys at once.
    ///
    /// Returns `None` if more keys are supplied than the payload has slots.
    pub fn chord(keys: &[HidKeyCode], modifiers: KeyboardModifiers) -> Option<Self> {
        if keys.len() > KEY_SLOT_COUNT {
            return None;
        }
        let mut slots = [0u8; KEY_SLOT_COUNT];
        for (slot, key) in slots.iter_mut().zip(keys) {
            *slot = key.as_u8();
        }
        Some(Self {
            modifiers,
            reserved: 0,
            keys: slots,
        })
    }

    /// The "all keys up" payload.
    pub fn release_all() -> Self {
        Self::default()
    }
}

/// Payload of [`CommandCode::SetConfig`].
///
/// The new IPv4 address travels in the header nonce; only the port is here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfigPayload {
    pub port: u16,
}

/// One 1024-byte slice of the 128×160 RGB565 LCD image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLine {
    pub pixels: [u8; SCREEN_LINE_SIZE],
}

// ── Monitor reports ───────────────────────────────────────────────────────────

/// Mouse half of a [`CompositeReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseReport {
    pub report_id: u8,
    pub buttons: u8,
    pub x: i16,
    pub y: i16,
    pub wheel: i16,
}

/// Keyboard half of a [`CompositeReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardReport {
    pub report_id: u8,
    pub modifiers: KeyboardModifiers,
    pub keys: [u8; KEY_SLOT_COUNT],
}

impl KeyboardReport {
    /// Returns `true` if `key` occupies any of the ten key slots.
    pub fn is_key_pressed(&self, key: HidKeyCode) -> bool {
        let code = key.as_u8();
        code != 0 && self.keys.contains(&code)
    }

    /// Iterates over the occupied key slots.
    pub fn pressed_keys(&self) -> impl Iterator<Item = HidKeyCode> + '_ {
        self.keys
            .iter()
            .filter(|&&code| code != 0)
            .map(|&code| HidKeyCode::from_u8(code))
    }
}

/// Snapshot of the physical mouse and keyboard streamed during monitor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositeReport {
    pub mouse: MouseReport,
    pub keyboard: KeyboardReport,
}

impl std::fmt::Display for CompositeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.mouse;
        write!(
            f,
            "mouse[{}] buttons=0x{:02X} x={} y={} wheel={} | keyboard[{}] modifiers=0x{:02X} keys={:?}",
            m.report_id,
            m.buttons,
            m.x,
            m.y,
            m.wheel,
            self.keyboard.report_id,
            self.keyboard.modifiers.0,
            self.keyboard.keys
        )
    }
}
