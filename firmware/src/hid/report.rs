//! Boot-protocol keyboard reports.
use zeroize::Zeroize;

pub const KEYBOARD_ROLLOVER: usize = 6;
pub const HID_REPORT_SIZE: usize = KEYBOARD_ROLLOVER + 2;

/// Eight-byte keyboard report: modifier byte, reserved byte, six key slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: [u8; KEYBOARD_ROLLOVER],
}

impl KeyboardReport {
    /// All keys released.
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            keys: [0; KEYBOARD_ROLLOVER],
        }
    }

    pub fn to_bytes(&self) -> [u8; HID_REPORT_SIZE] {
        let mut data = [0u8; HID_REPORT_SIZE];
        data[0] = self.modifiers;
        data[2..].copy_from_slice(&self.keys);
        data
    }

    pub fn from_bytes(data: [u8; HID_REPORT_SIZE]) -> Self {
        let mut keys = [0u8; KEYBOARD_ROLLOVER];
        keys.copy_from_slice(&data[2..]);
        Self {
            modifiers: data[0],
            keys,
        }
    }

    /// Build a report pressing `pressed`, truncated to the rollover limit.
    pub fn from_keys(modifiers: u8, pressed: &[u8]) -> Self {
        let mut report = Self::empty();
        report.modifiers = modifiers;
        for (slot, key) in report.keys.iter_mut().zip(pressed.iter().copied()) {
            *slot = key;
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.iter().all(|&key| key == 0)
    }
}

// Reports carry password scan codes.
impl Zeroize for KeyboardReport {
    fn zeroize(&mut self) {
        self.modifiers.zeroize();
        self.keys.zeroize();
    }
}
