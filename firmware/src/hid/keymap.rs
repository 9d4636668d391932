//! Character to scan code tables for the supported host keyboard layouts.
//!
//! Each layout carries two bitmasks and a scan code table, all indexed by `ascii - 0x20`. The
//! values were captured against real host keymaps and must stay bit-exact: a changed entry types a
//! different password on the host.
use core::fmt;

use heapless::Vec as HeaplessVec;
use zeroize::{DefaultIsZeroes, Zeroize};

use super::report::KeyboardReport;

/// First printable character covered by the tables.
pub const KEYCODE_START: u8 = 0x20;
/// Number of characters covered by the tables, `0x20..=0x7E`.
pub const MAPPING_LENGTH: usize = 95;
/// Longest password that can be pre-mapped.
pub const MAX_KEYSTROKES: usize = u8::MAX as usize;

pub const MODIFIER_LEFT_SHIFT: u8 = 0x02;
pub const MODIFIER_RIGHT_ALT: u8 = 0x40;

const MASK_LENGTH: usize = 12;

/// Selector persisted for the German layout, listed in the settings but never shipped.
pub const QWERTZ_SELECTOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapError {
    /// Character outside the printable range.
    OutOfRange(u8),
    /// Persisted selector without a table.
    UnsupportedLayout(u32),
    /// More characters than a keystroke buffer holds.
    TooLong(usize),
}

impl fmt::Display for KeymapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeymapError::OutOfRange(byte) => write!(f, "byte 0x{byte:02X} has no key mapping"),
            KeymapError::UnsupportedLayout(selector) => {
                write!(f, "keyboard layout {selector} is not supported")
            }
            KeymapError::TooLong(length) => {
                write!(f, "{length} characters exceed the {MAX_KEYSTROKES} keystroke buffer")
            }
        }
    }
}

impl core::error::Error for KeymapError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardLayout {
    /// US QWERTY.
    #[default]
    Qwerty,
    /// French AZERTY.
    Azerty,
}

impl KeyboardLayout {
    pub fn from_selector(selector: u32) -> Result<Self, KeymapError> {
        match selector {
            0 => Ok(KeyboardLayout::Qwerty),
            1 => Ok(KeyboardLayout::Azerty),
            other => Err(KeymapError::UnsupportedLayout(other)),
        }
    }

    pub const fn selector(self) -> u32 {
        match self {
            KeyboardLayout::Qwerty => 0,
            KeyboardLayout::Azerty => 1,
        }
    }

    fn table(self) -> &'static LayoutTable {
        match self {
            KeyboardLayout::Qwerty => &QWERTY,
            KeyboardLayout::Azerty => &AZERTY,
        }
    }
}

struct LayoutTable {
    alt: [u8; MASK_LENGTH],
    shift: [u8; MASK_LENGTH],
    keys: [u8; MAPPING_LENGTH],
}

impl LayoutTable {
    fn stroke(&self, index: usize) -> KeyStroke {
        let bit = 1u8 << (index % 8);
        let mut modifiers = 0;
        if self.alt[index / 8] & bit != 0 {
            modifiers |= MODIFIER_RIGHT_ALT;
        }
        if self.shift[index / 8] & bit != 0 {
            modifiers |= MODIFIER_LEFT_SHIFT;
        }
        KeyStroke {
            modifiers,
            reserved: 0,
            scan_code: self.keys[index],
        }
    }
}

static QWERTY: LayoutTable = LayoutTable {
    alt: [
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ],
    shift: [
        0x7E, 0x0F, 0x00, 0xD4, 0xFF, 0xFF, 0xFF, 0xC7,
        0x00, 0x00, 0x00, 0x78,
    ],
    keys: [
        0x2C, 0x1E, 0x34, 0x20, 0x21, 0x22, 0x24, 0x34,
        0x26, 0x27, 0x25, 0x2E, 0x36, 0x2D, 0x37, 0x38,
        0x27, 0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0x24,
        0x25, 0x26, 0x33, 0x33, 0x36, 0x2E, 0x37, 0x38,
        0x1F, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A,
        0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12,
        0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A,
        0x1B, 0x1C, 0x1D, 0x2F, 0x31, 0x30, 0x23, 0x2D,
        0x35, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A,
        0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12,
        0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A,
        0x1B, 0x1C, 0x1D, 0x2F, 0x31, 0x30, 0x35,
    ],
};

static AZERTY: LayoutTable = LayoutTable {
    alt: [
        0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x78,
        0x01, 0x00, 0x00, 0x78,
    ],
    shift: [
        0x20, 0xC8, 0xFF, 0xC3, 0xFE, 0xFF, 0xFF, 0x07,
        0x00, 0x00, 0x00, 0x00,
    ],
    keys: [
        0x2C, 0x38, 0x20, 0x20, 0x30, 0x34, 0x1E, 0x21,
        0x22, 0x2D, 0x32, 0x2E, 0x10, 0x23, 0x36, 0x37,
        0x27, 0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0x24,
        0x25, 0x26, 0x37, 0x36, 0x64, 0x2E, 0x64, 0x10,
        0x27, 0x14, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A,
        0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x33, 0x11, 0x12,
        0x13, 0x04, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1D,
        0x1B, 0x1C, 0x1A, 0x22, 0x25, 0x2D, 0x26, 0x25,
        0x24, 0x14, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A,
        0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x33, 0x11, 0x12,
        0x13, 0x04, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1D,
        0x1B, 0x1C, 0x1A, 0x21, 0x23, 0x2E, 0x1F,
    ],
};

/// One key press: modifier byte, reserved byte, scan code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyStroke {
    pub modifiers: u8,
    pub reserved: u8,
    pub scan_code: u8,
}

impl DefaultIsZeroes for KeyStroke {}

impl KeyStroke {
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.modifiers, self.reserved, self.scan_code]
    }

    /// Report pressing this key with its modifiers.
    pub fn report(&self) -> KeyboardReport {
        KeyboardReport::from_keys(self.modifiers, &[self.scan_code])
    }
}

/// Translate a printable ASCII byte into the key press producing it on `layout`.
pub fn map_char(layout: KeyboardLayout, ascii: u8) -> Result<KeyStroke, KeymapError> {
    let index = usize::from(ascii.wrapping_sub(KEYCODE_START));
    if ascii < KEYCODE_START || index >= MAPPING_LENGTH {
        return Err(KeymapError::OutOfRange(ascii));
    }
    Ok(layout.table().stroke(index))
}

/// Key presses for a whole password, wiped when dropped.
pub struct Keystrokes {
    strokes: HeaplessVec<KeyStroke, MAX_KEYSTROKES>,
}

impl Keystrokes {
    /// Map every byte up front so a bad character aborts before anything is typed.
    pub fn map(layout: KeyboardLayout, text: &[u8]) -> Result<Self, KeymapError> {
        if text.len() > MAX_KEYSTROKES {
            return Err(KeymapError::TooLong(text.len()));
        }
        let mut strokes = HeaplessVec::new();
        for &byte in text {
            let stroke = map_char(layout, byte)?;
            if strokes.push(stroke).is_err() {
                return Err(KeymapError::TooLong(text.len()));
            }
        }
        Ok(Self { strokes })
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyStroke> {
        self.strokes.iter()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

impl Drop for Keystrokes {
    fn drop(&mut self) {
        self.strokes.as_mut_slice().zeroize();
    }
}
