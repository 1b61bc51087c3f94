use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::trace;

use crate::error::{Error, Result};

/// Key transition posted to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
pub enum KeyState {
    Down,
    Up,
}

impl KeyState {
    /// Window message carrying this transition (`WM_KEYDOWN` / `WM_KEYUP`)
    pub fn message(self) -> u32 {
        match self {
            Self::Down => 0x0100,
            Self::Up => 0x0101,
        }
    }
}

/// A Windows virtual-key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualKey(pub u16);

impl VirtualKey {
    pub const TAB: VirtualKey = VirtualKey(0x09);
    pub const RETURN: VirtualKey = VirtualKey(0x0D);
    pub const SHIFT: VirtualKey = VirtualKey(0x10);
    pub const CONTROL: VirtualKey = VirtualKey(0x11);
    pub const MENU: VirtualKey = VirtualKey(0x12);
    pub const SPACE: VirtualKey = VirtualKey(0x20);
    pub const A: VirtualKey = VirtualKey(0x41);
    pub const D: VirtualKey = VirtualKey(0x44);
    pub const S: VirtualKey = VirtualKey(0x53);
    pub const W: VirtualKey = VirtualKey(0x57);
    pub const DIVIDE: VirtualKey = VirtualKey(0x6F);

    /// Key for an ASCII letter or digit
    pub fn from_ascii(ch: char) -> Option<Self> {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' => Some(Self(ch.to_ascii_uppercase() as u16)),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            0x30..=0x39 | 0x41..=0x5A => write!(f, "{}", self.0 as u8 as char),
            code => write!(f, "VK_0x{:02X}", code),
        }
    }
}

/// A key plus the modifiers needed to produce a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: VirtualKey,
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl KeyStroke {
    pub const fn plain(key: VirtualKey) -> Self {
        Self {
            key,
            shift: false,
            control: false,
            alt: false,
        }
    }
}

/// Destination for emulated key events
pub trait KeySink {
    /// Post one key transition. Delivery is not acknowledged.
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()>;
}

impl<T: KeySink> KeySink for &T {
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()> {
        (**self).send_key(state, key)
    }
}

impl<T: KeySink> KeySink for Arc<T> {
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()> {
        (**self).send_key(state, key)
    }
}

/// Decode a packed `VkKeyScan` result.
///
/// The low byte is the virtual key, the high byte holds shift (1), control (2)
/// and alt (4). `/` always maps to the numpad divide key.
pub fn decode_vk_scan(raw: i16, ch: char) -> Option<KeyStroke> {
    if ch == '/' {
        return Some(KeyStroke::plain(VirtualKey::DIVIDE));
    }

    let raw = raw as u16;
    let code = raw & 0xFF;
    let modifiers = raw >> 8;
    if code == 0xFF {
        return None;
    }

    Some(KeyStroke {
        key: VirtualKey(code),
        shift: modifiers & 1 != 0,
        control: modifiers & 2 != 0,
        alt: modifiers & 4 != 0,
    })
}

/// Map a printable character to the key that types it
pub fn char_to_key(ch: char) -> Option<KeyStroke> {
    decode_vk_scan(vk_scan(ch), ch)
}

#[cfg(target_os = "windows")]
fn vk_scan(ch: char) -> i16 {
    use windows::Win32::UI::Input::KeyboardAndMouse::VkKeyScanW;

    let mut units = [0u16; 2];
    let encoded = ch.encode_utf16(&mut units);
    if encoded.len() != 1 {
        return -1;
    }
    // SAFETY: VkKeyScanW only inspects the active keyboard layout.
    unsafe { VkKeyScanW(encoded[0]) }
}

/// US layout table in `VkKeyScan` format for platforms without the API
#[cfg(not(target_os = "windows"))]
fn vk_scan(ch: char) -> i16 {
    const SHIFT: i16 = 0x100;

    match ch {
        'a'..='z' => ch.to_ascii_uppercase() as i16,
        'A'..='Z' => ch as i16 | SHIFT,
        '0'..='9' => ch as i16,
        ' ' => 0x20,
        '\t' => 0x09,
        '\r' | '\n' => 0x0D,
        '!' => '1' as i16 | SHIFT,
        '@' => '2' as i16 | SHIFT,
        '#' => '3' as i16 | SHIFT,
        '$' => '4' as i16 | SHIFT,
        '%' => '5' as i16 | SHIFT,
        '^' => '6' as i16 | SHIFT,
        '&' => '7' as i16 | SHIFT,
        '*' => '8' as i16 | SHIFT,
        '(' => '9' as i16 | SHIFT,
        ')' => '0' as i16 | SHIFT,
        ';' => 0xBA,
        ':' => 0xBA | SHIFT,
        '=' => 0xBB,
        '+' => 0xBB | SHIFT,
        ',' => 0xBC,
        '<' => 0xBC | SHIFT,
        '-' => 0xBD,
        '_' => 0xBD | SHIFT,
        '.' => 0xBE,
        '>' => 0xBE | SHIFT,
        '/' => 0xBF,
        '?' => 0xBF | SHIFT,
        '`' => 0xC0,
        '~' => 0xC0 | SHIFT,
        '[' => 0xDB,
        '{' => 0xDB | SHIFT,
        '\\' => 0xDC,
        '|' => 0xDC | SHIFT,
        ']' => 0xDD,
        '}' => 0xDD | SHIFT,
        '\'' => 0xDE,
        '"' => 0xDE | SHIFT,
        _ => -1,
    }
}

/// Send one `state` event per character of `text`.
///
/// Only the base key is posted; modifiers reported by [`char_to_key`] are not
/// pressed.
pub fn type_text<K: KeySink>(sink: &K, state: KeyState, text: &str) -> Result<()> {
    for ch in text.chars() {
        let stroke = char_to_key(ch).ok_or(Error::UnmappedCharacter(ch))?;
        trace!("type {:?} -> {} {}", ch, stroke.key, state);
        sink.send_key(state, stroke.key)?;
    }
    Ok(())
}
