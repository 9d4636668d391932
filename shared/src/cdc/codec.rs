//! Direction-aware sealing and checking of CDC frames.
//!
//! Each end of the link owns a [`LinkCodec`]: the host seals commands and accepts responses, the
//! keyboard does the opposite. A frame travelling the wrong way is rejected before its body is
//! read.
use crate::cdc::{
    FRAME_HEADER_SIZE, FrameHeader, FrameHeaderError, FrameKind, PROTOCOL_VERSION, compute_crc32,
};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// Body is larger than this end accepts.
    Oversized { length: usize, limit: usize },
    /// Peer speaks another framing revision.
    VersionMismatch { ours: u16, theirs: u16 },
    /// Body length disagrees with the header.
    Truncated { declared: usize, received: usize },
    /// Body does not match its CRC32.
    Corrupted { declared: u32, computed: u32 },
    /// Frame came from our own side of the link.
    WrongDirection { found: FrameKind },
    Header(FrameHeaderError),
}

impl fmt::Display for LinkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkFault::Oversized { length, limit } => {
                write!(f, "{length} byte frame body is over the {limit} byte limit")
            }
            LinkFault::VersionMismatch { ours, theirs } => {
                write!(f, "peer uses framing revision {theirs}, this end speaks {ours}")
            }
            LinkFault::Truncated { declared, received } => {
                write!(f, "frame announced {declared} bytes, {received} arrived")
            }
            LinkFault::Corrupted { declared, computed } => write!(
                f,
                "frame body CRC32 is 0x{computed:08X}, header says 0x{declared:08X}"
            ),
            LinkFault::WrongDirection { found } => {
                write!(f, "received a {found:?} frame from the wrong end of the link")
            }
            LinkFault::Header(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for LinkFault {}

impl From<FrameHeaderError> for LinkFault {
    fn from(value: FrameHeaderError) -> Self {
        LinkFault::Header(value)
    }
}

/// Framing rules for one end of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCodec {
    version: u16,
    max_body: usize,
    inbound: FrameKind,
}

impl LinkCodec {
    /// Host end: sends commands, accepts responses up to `max_body` bytes.
    pub const fn host(max_body: usize) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            max_body,
            inbound: FrameKind::Response,
        }
    }

    /// Keyboard end: accepts commands up to `max_body` bytes, sends responses.
    pub const fn device(max_body: usize) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            max_body,
            inbound: FrameKind::Command,
        }
    }

    /// Same rules, different framing revision.
    pub const fn with_version(self, version: u16) -> Self {
        Self { version, ..self }
    }

    pub const fn inbound(&self) -> FrameKind {
        self.inbound
    }

    pub const fn outbound(&self) -> FrameKind {
        match self.inbound {
            FrameKind::Command => FrameKind::Response,
            FrameKind::Response => FrameKind::Command,
        }
    }

    /// Header announcing `body` in this end's sending direction.
    pub fn seal(&self, body: &[u8]) -> Result<[u8; FRAME_HEADER_SIZE], LinkFault> {
        let limit = self.max_body.min(u32::MAX as usize);
        if body.len() > limit {
            return Err(LinkFault::Oversized {
                length: body.len(),
                limit,
            });
        }
        let header = FrameHeader::new(
            self.version,
            self.outbound(),
            body.len() as u32,
            compute_crc32(body),
        );
        Ok(header.to_bytes())
    }

    /// Check an inbound header. On success the caller reads exactly `header.length` bytes.
    pub fn open(&self, bytes: [u8; FRAME_HEADER_SIZE]) -> Result<FrameHeader, LinkFault> {
        let header = FrameHeader::from_bytes(bytes)?;
        if header.version != self.version {
            return Err(LinkFault::VersionMismatch {
                ours: self.version,
                theirs: header.version,
            });
        }
        if header.kind != self.inbound {
            return Err(LinkFault::WrongDirection { found: header.kind });
        }
        let length = header.length as usize;
        if length > self.max_body {
            return Err(LinkFault::Oversized {
                length,
                limit: self.max_body,
            });
        }
        Ok(header)
    }

    /// Check a received body against the header that announced it.
    pub fn verify(&self, header: &FrameHeader, body: &[u8]) -> Result<(), LinkFault> {
        let declared = header.length as usize;
        if body.len() != declared {
            return Err(LinkFault::Truncated {
                declared,
                received: body.len(),
            });
        }
        let computed = compute_crc32(body);
        if computed != header.checksum {
            return Err(LinkFault::Corrupted {
                declared: header.checksum,
                computed,
            });
        }
        Ok(())
    }
}
