//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! The KMBox keyboard payload and the monitor keyboard report both carry keys
//! as one-byte HID usage ids, so this table is the only key vocabulary the
//! client needs.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The USB HID standard assigns a number to every physical key position.
//! Letters start at 0x04, not at ASCII 'A' (0x41), because the code names a
//! key, not a character.  Which character the key produces depends on the
//! keyboard layout and on the modifiers held down.  See
//! [`crate::keymap::text`] for the US-layout character table.
//!
//! # The `Unknown` sentinel
//!
//! Usage id 0 means "no key".  It marks empty slots in keyboard payloads and
//! reports, and [`HidKeyCode::from_u8`] returns [`HidKeyCode::Unknown`] for any
//! value this table does not name.

use serde::{Deserialize, Serialize};

macro_rules! hid_key_codes {
    ($( $(#[$meta:meta])* $name:ident = $value:literal, )+) => {
        /// USB HID Usage ID for keyboard keys (page 0x07).
        ///
        /// The discriminant of each variant is its usage id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum HidKeyCode {
            $( $(#[$meta])* $name = $value, )+
        }

        impl HidKeyCode {
            /// Every named key, in usage-id order of declaration.
            pub const ALL: &'static [HidKeyCode] = &[ $( HidKeyCode::$name, )+ ];

            /// Converts a raw usage id to a [`HidKeyCode`].
            ///
            /// Returns [`HidKeyCode::Unknown`] for values without a variant.
            pub fn from_u8(value: u8) -> Self {
                match value {
                    $( $value => HidKeyCode::$name, )+
                    _ => HidKeyCode::Unknown,
                }
            }
        }
    };
}

hid_key_codes! {
    /// "No key"; also the value of empty slots.
    #[default]
    Unknown = 0x00,

    KeyA = 0x04, KeyB = 0x05, KeyC = 0x06, KeyD = 0x07, KeyE = 0x08, KeyF = 0x09,
    KeyG = 0x0A, KeyH = 0x0B, KeyI = 0x0C, KeyJ = 0x0D, KeyK = 0x0E, KeyL = 0x0F,
    KeyM = 0x10, KeyN = 0x11, KeyO = 0x12, KeyP = 0x13, KeyQ = 0x14, KeyR = 0x15,
    KeyS = 0x16, KeyT = 0x17, KeyU = 0x18, KeyV = 0x19, KeyW = 0x1A, KeyX = 0x1B,
    KeyY = 0x1C, KeyZ = 0x1D,

    Digit1 = 0x1E, Digit2 = 0x1F, Digit3 = 0x20, Digit4 = 0x21, Digit5 = 0x22,
    Digit6 = 0x23, Digit7 = 0x24, Digit8 = 0x25, Digit9 = 0x26, Digit0 = 0x27,

    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    /// ISO key next to Enter.
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    F1 = 0x3A, F2 = 0x3B, F3 = 0x3C, F4 = 0x3D, F5 = 0x3E, F6 = 0x3F,
    F7 = 0x40, F8 = 0x41, F9 = 0x42, F10 = 0x43, F11 = 0x44, F12 = 0x45,

    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59, Numpad2 = 0x5A, Numpad3 = 0x5B, Numpad4 = 0x5C, Numpad5 = 0x5D,
    Numpad6 = 0x5E, Numpad7 = 0x5F, Numpad8 = 0x60, Numpad9 = 0x61, Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    /// ISO key between Left Shift and Z.
    NonUsBackslash = 0x64,
    ContextMenu = 0x65,

    F13 = 0x68, F14 = 0x69, F15 = 0x6A, F16 = 0x6B, F17 = 0x6C, F18 = 0x6D,
    F19 = 0x6E, F20 = 0x6F, F21 = 0x70, F22 = 0x71, F23 = 0x72, F24 = 0x73,

    Mute = 0x7F,
    VolumeUp = 0x80,
    VolumeDown = 0x81,

    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl HidKeyCode {
    /// Returns the raw usage id.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the eight modifier keys (0xE0–0xE7).
    ///
    /// The device expects modifiers in the modifier byte of a keyboard
    /// payload, not in the key slots.
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.as_u8())
    }
}
