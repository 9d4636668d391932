//! Command frames exchanged with the device: `[class][instruction][p1][p2][lc][payload]`.
use alloc::vec::Vec;
use core::convert::TryFrom;
use core::fmt;

/// Application class byte every command frame must carry.
pub const CLA: u8 = 0xE0;

/// Size in bytes of the fixed command header, including the `lc` byte.
pub const COMMAND_HEADER_SIZE: usize = 5;

/// Largest payload a single command frame can carry.
pub const MAX_COMMAND_PAYLOAD: usize = u8::MAX as usize;

/// Instructions understood by the label log dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    /// Append a new label record.
    WriteLabel = 0x05,
    /// Advance the read cursor and return the label found there.
    ReadNext = 0x06,
    /// Step the read cursor back and return the label found there.
    ReadPrevious = 0x07,
    /// Zero the whole label log.
    WipeAll = 0x08,
}

impl TryFrom<u8> for Instruction {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x05 => Ok(Instruction::WriteLabel),
            0x06 => Ok(Instruction::ReadNext),
            0x07 => Ok(Instruction::ReadPrevious),
            0x08 => Ok(Instruction::WipeAll),
            other => Err(other),
        }
    }
}

impl From<Instruction> for u8 {
    fn from(value: Instruction) -> Self {
        value as u8
    }
}

/// Errors raised while parsing or building a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// No bytes were received.
    Empty,
    /// Fewer bytes than the fixed header.
    Truncated { length: usize },
    /// The `lc` byte disagrees with the bytes that followed it.
    LengthMismatch { declared: usize, actual: usize },
    /// Payload does not fit in a single `lc` byte.
    PayloadTooLarge { actual: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Empty => write!(f, "empty command frame"),
            FrameError::Truncated { length } => {
                write!(f, "command frame of {length} bytes is shorter than its header")
            }
            FrameError::LengthMismatch { declared, actual } => {
                write!(f, "command declared {declared} payload bytes but carried {actual}")
            }
            FrameError::PayloadTooLarge { actual } => {
                write!(
                    f,
                    "payload of {actual} bytes exceeds the {MAX_COMMAND_PAYLOAD} byte limit"
                )
            }
        }
    }
}

impl core::error::Error for FrameError {}

/// Borrowed view over a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame<'a> {
    pub class: u8,
    pub instruction: u8,
    pub p1: u8,
    pub p2: u8,
    pub payload: &'a [u8],
}

impl<'a> CommandFrame<'a> {
    /// Build an application-class frame for the given instruction.
    pub const fn new(instruction: Instruction, payload: &'a [u8]) -> Self {
        Self {
            class: CLA,
            instruction: instruction as u8,
            p1: 0,
            p2: 0,
            payload,
        }
    }

    /// Split raw bytes into header fields and payload.
    ///
    /// The class byte is not checked here; rejecting foreign classes is the dispatcher's call.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }
        if bytes.len() < COMMAND_HEADER_SIZE {
            return Err(FrameError::Truncated {
                length: bytes.len(),
            });
        }

        let declared = usize::from(bytes[4]);
        let payload = &bytes[COMMAND_HEADER_SIZE..];
        if payload.len() != declared {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(Self {
            class: bytes[0],
            instruction: bytes[1],
            p1: bytes[2],
            p2: bytes[3],
            payload,
        })
    }

    /// Resolve the instruction byte, handing back the raw value when it is unknown.
    pub fn instruction(&self) -> Result<Instruction, u8> {
        Instruction::try_from(self.instruction)
    }

    /// Serialize the frame for transmission.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        if self.payload.len() > MAX_COMMAND_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                actual: self.payload.len(),
            });
        }

        let mut bytes = Vec::with_capacity(COMMAND_HEADER_SIZE + self.payload.len());
        bytes.extend_from_slice(&[
            self.class,
            self.instruction,
            self.p1,
            self.p2,
            self.payload.len() as u8,
        ]);
        bytes.extend_from_slice(self.payload);
        Ok(bytes)
    }
}
