//! Character to keystroke table for a US keyboard layout.
//!
//! Typing text on the device means pressing a physical key, possibly with
//! Shift held.  This module answers "which key, with which modifiers" for
//! every printable ASCII character plus space, tab and newline.  Anything else
//! (accented letters, emoji, control characters) has no mapping.

use crate::keymap::hid::HidKeyCode;
use crate::protocol::messages::KeyboardModifiers;

/// A physical key plus the modifiers needed to produce a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub key: HidKeyCode,
    pub modifiers: KeyboardModifiers,
}

impl KeyStroke {
    const fn plain(key: HidKeyCode) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    const fn shifted(key: HidKeyCode) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::LEFT_SHIFT,
        }
    }
}

/// Looks up the keystroke that types `c` on a US layout.
///
/// Returns `None` if the character cannot be typed with a single key.
///
/// # Examples
///
/// ```rust
/// use kmbox_core::keymap::text::lookup;
/// use kmbox_core::keymap::hid::HidKeyCode;
///
/// let stroke = lookup('A').unwrap();
/// assert_eq!(stroke.key, HidKeyCode::KeyA);
/// assert!(stroke.modifiers.shift());
/// assert!(lookup('é').is_none());
/// ```
pub fn lookup(c: char) -> Option<KeyStroke> {
    use HidKeyCode::*;

    let stroke = match c {
        'a'..='z' => KeyStroke::plain(letter(c as u8 - b'a')),
        'A'..='Z' => KeyStroke::shifted(letter(c as u8 - b'A')),
        '1'..='9' => KeyStroke::plain(HidKeyCode::from_u8(Digit1.as_u8() + (c as u8 - b'1'))),
        '0' => KeyStroke::plain(Digit0),

        ' ' => KeyStroke::plain(Space),
        '\n' => KeyStroke::plain(Enter),
        '\t' => KeyStroke::plain(Tab),
        '-' => KeyStroke::plain(Minus),
        '=' => KeyStroke::plain(Equal),
        '[' => KeyStroke::plain(BracketLeft),
        ']' => KeyStroke::plain(BracketRight),
        '\\' => KeyStroke::plain(Backslash),
        ';' => KeyStroke::plain(Semicolon),
        '\'' => KeyStroke::plain(Quote),
        '`' => KeyStroke::plain(Backquote),
        ',' => KeyStroke::plain(Comma),
        '.' => KeyStroke::plain(Period),
        '/' => KeyStroke::plain(Slash),

        '!' => KeyStroke::shifted(Digit1),
        '@' => KeyStroke::shifted(Digit2),
        '#' => KeyStroke::shifted(Digit3),
        '$' => KeyStroke::shifted(Digit4),
        '%' => KeyStroke::shifted(Digit5),
        '^' => KeyStroke::shifted(Digit6),
        '&' => KeyStroke::shifted(Digit7),
        '*' => KeyStroke::shifted(Digit8),
        '(' => KeyStroke::shifted(Digit9),
        ')' => KeyStroke::shifted(Digit0),
        '_' => KeyStroke::shifted(Minus),
        '+' => KeyStroke::shifted(Equal),
        '{' => KeyStroke::shifted(BracketLeft),
        '}' => KeyStroke::shifted(BracketRight),
        '|' => KeyStroke::shifted(Backslash),
        ':' => KeyStroke::shifted(Semicolon),
        '"' => KeyStroke::shifted(Quote),
        '~' => KeyStroke::shifted(Backquote),
        '<' => KeyStroke::shifted(Comma),
        '>' => KeyStroke::shifted(Period),
        '?' => KeyStroke::shifted(Slash),

        _ => return None,
    };
    Some(stroke)
}

fn letter(offset: u8) -> HidKeyCode {
    HidKeyCode::from_u8(HidKeyCode::KeyA.as_u8() + offset)
}
