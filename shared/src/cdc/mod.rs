//! Framing of the USB CDC command link between the host tool and the keyboard.
//!
//! Every frame is a fixed little-endian header followed by its body:
//!
//! | bytes  | field                         |
//! |--------|-------------------------------|
//! | 0..4   | magic `"PWMF"`                |
//! | 4..6   | framing revision              |
//! | 6..8   | direction ([`FrameKind`])     |
//! | 8..12  | body length                   |
//! | 12..16 | CRC32 of the body             |
use core::ops::Range;

pub mod codec;

pub const FRAME_MAGIC: [u8; 4] = *b"PWMF";

const MAGIC_AT: Range<usize> = 0..4;
const VERSION_AT: Range<usize> = 4..6;
const KIND_AT: Range<usize> = 6..8;
const LENGTH_AT: Range<usize> = 8..12;
const CHECKSUM_AT: Range<usize> = 12..16;

pub const FRAME_HEADER_SIZE: usize = CHECKSUM_AT.end;

/// Revision of the CDC framing understood by both sides.
pub const PROTOCOL_VERSION: u16 = 1;

/// Largest body the keyboard accepts or sends in one frame.
pub const FRAME_MAX_PAYLOAD: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FrameKind {
    /// Host to keyboard, body is a command frame.
    Command = 0x0001,
    /// Keyboard to host, body is response data plus status word.
    Response = 0x8001,
}

impl TryFrom<u16> for FrameKind {
    type Error = FrameHeaderError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        [FrameKind::Command, FrameKind::Response]
            .into_iter()
            .find(|kind| *kind as u16 == raw)
            .ok_or(FrameHeaderError::UnknownKind(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeaderError {
    /// First four bytes were not [`FRAME_MAGIC`]; the stream is out of step or not ours.
    ForeignMagic([u8; 4]),
    UnknownKind(u16),
}

impl core::fmt::Display for FrameHeaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameHeaderError::ForeignMagic(magic) => {
                write!(f, "frame starts with {magic:02X?} instead of the link magic")
            }
            FrameHeaderError::UnknownKind(kind) => {
                write!(f, "frame direction 0x{kind:04X} is neither command nor response")
            }
        }
    }
}

impl core::error::Error for FrameHeaderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub kind: FrameKind,
    /// Body length in bytes.
    pub length: u32,
    /// CRC32 of the body.
    pub checksum: u32,
}

impl FrameHeader {
    pub const fn new(version: u16, kind: FrameKind, length: u32, checksum: u32) -> Self {
        Self {
            version,
            kind,
            length,
            checksum,
        }
    }

    pub fn to_bytes(self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[MAGIC_AT].copy_from_slice(&FRAME_MAGIC);
        bytes[VERSION_AT].copy_from_slice(&self.version.to_le_bytes());
        bytes[KIND_AT].copy_from_slice(&(self.kind as u16).to_le_bytes());
        bytes[LENGTH_AT].copy_from_slice(&self.length.to_le_bytes());
        bytes[CHECKSUM_AT].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; FRAME_HEADER_SIZE]) -> Result<Self, FrameHeaderError> {
        let magic = field::<4>(&bytes, MAGIC_AT);
        if magic != FRAME_MAGIC {
            return Err(FrameHeaderError::ForeignMagic(magic));
        }
        Ok(Self {
            version: u16::from_le_bytes(field(&bytes, VERSION_AT)),
            kind: FrameKind::try_from(u16::from_le_bytes(field(&bytes, KIND_AT)))?,
            length: u32::from_le_bytes(field(&bytes, LENGTH_AT)),
            checksum: u32::from_le_bytes(field(&bytes, CHECKSUM_AT)),
        })
    }
}

fn field<const N: usize>(bytes: &[u8; FRAME_HEADER_SIZE], at: Range<usize>) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at]);
    out
}

pub fn compute_crc32(body: &[u8]) -> u32 {
    crc32fast::hash(body)
}
