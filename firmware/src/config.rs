//! Compile-time defaults and the password policy applied to every derivation.
use crate::crypto::charset::{MinimumCounts, SetMask};
use crate::storage::MAX_METADATA_BYTES;

/// Characters typed for every password.
pub const DEFAULT_PASSWORD_LENGTH: u8 = 20;

/// Interface number of the keyboard IN endpoint.
pub const HID_ENDPOINT: u8 = 0x01;

/// Which character classes a password draws from and how many of each it must contain.
///
/// Changing any field changes every password derived afterwards, so the device only ever uses
/// [`PasswordPolicy::DEFAULT`] for typed passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub length: u8,
    pub mask: SetMask,
    pub minimums: MinimumCounts,
}

impl PasswordPolicy {
    pub const DEFAULT: Self = Self {
        length: DEFAULT_PASSWORD_LENGTH,
        mask: SetMask::ALL,
        minimums: MinimumCounts::DEFAULT,
    };

    pub const fn new(length: u8, mask: SetMask, minimums: MinimumCounts) -> Self {
        Self {
            length,
            mask,
            minimums,
        }
    }

    /// Characters the enabled classes demand in total.
    pub fn required(&self) -> usize {
        self.minimums.required(self.mask)
    }

    /// Whether a password of `length` characters can honour every minimum.
    pub fn is_satisfiable(&self) -> bool {
        let length = usize::from(self.length);
        if self.required() > length {
            return false;
        }
        length == 0 || !self.mask.is_empty()
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runtime knobs handed to the dispatcher at boot. Typed passwords always use
/// [`PasswordPolicy::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub hid_endpoint: u8,
    pub log_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hid_endpoint: HID_ENDPOINT,
            log_capacity: MAX_METADATA_BYTES,
        }
    }
}
