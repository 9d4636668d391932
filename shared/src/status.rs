//! Two-byte status words terminating every device response.
use alloc::vec::Vec;
use core::fmt;

/// Big-endian status word appended to each response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    pub const OK: Self = Self(0x9000);
    pub const NO_FRAME: Self = Self(0x6982);
    pub const WRONG_LENGTH: Self = Self(0x6700);
    pub const INS_NOT_SUPPORTED: Self = Self(0x6D00);
    pub const CLA_NOT_SUPPORTED: Self = Self(0x6E00);

    const INTERNAL_BASE: u16 = 0x6800;
    const INTERNAL_MASK: u16 = 0x07FF;

    /// Classify a raw fault code the way the dispatcher reports it.
    ///
    /// Codes in the `0x6xxx` and `0x9xxx` ranges pass through untouched; anything else is folded
    /// into the internal range with its low eleven bits preserved.
    pub const fn from_raw(code: u16) -> Self {
        match code & 0xF000 {
            0x6000 | 0x9000 => Self(code),
            _ => Self::internal(code),
        }
    }

    /// Internal fault status carrying `code` in its low eleven bits.
    pub const fn internal(code: u16) -> Self {
        Self(Self::INTERNAL_BASE | (code & Self::INTERNAL_MASK))
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Fault code carried by an internal status word.
    ///
    /// Only `0x68xx` is recognised: wider codes overlap the `0x69xx..=0x6Fxx` protocol words and
    /// cannot be told apart on the wire.
    pub const fn internal_code(self) -> Option<u16> {
        if self.0 & 0xFF00 == Self::INTERNAL_BASE {
            Some(self.0 & 0x00FF)
        } else {
            None
        }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl From<StatusWord> for u16 {
    fn from(value: StatusWord) -> Self {
        value.0
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            StatusWord::OK => "success",
            StatusWord::NO_FRAME => "no frame received",
            StatusWord::WRONG_LENGTH => "wrong length",
            StatusWord::INS_NOT_SUPPORTED => "instruction not supported",
            StatusWord::CLA_NOT_SUPPORTED => "class not supported",
            other if other.internal_code().is_some() => "internal fault",
            _ => "protocol fault",
        };
        write!(f, "0x{:04X} ({label})", self.0)
    }
}

/// Errors raised while splitting a response into data and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    /// Response ended before a full status word.
    MissingStatus { length: usize },
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseError::MissingStatus { length } => {
                write!(f, "response of {length} bytes has no status word")
            }
        }
    }
}

impl core::error::Error for ResponseError {}

/// Concatenate response data and its trailing status word.
pub fn encode_response(data: &[u8], status: StatusWord) -> Vec<u8> {
    let mut response = Vec::with_capacity(data.len() + 2);
    response.extend_from_slice(data);
    response.extend_from_slice(&status.to_bytes());
    response
}

/// Split a response into its data and trailing status word.
pub fn split_response(response: &[u8]) -> Result<(&[u8], StatusWord), ResponseError> {
    let Some(split) = response.len().checked_sub(2) else {
        return Err(ResponseError::MissingStatus {
            length: response.len(),
        });
    };
    let (data, status) = response.split_at(split);
    Ok((data, StatusWord::from_bytes([status[0], status[1]])))
}
