//! Command channel to the host over a CDC serial stream.
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use embedded_io::{Read, ReadExactError, Write};
use shared::cdc::codec::{LinkCodec, LinkFault};
use shared::cdc::{FRAME_HEADER_SIZE, FRAME_MAX_PAYLOAD};

/// Keyboard end of the link.
pub const DEVICE_CODEC: LinkCodec = LinkCodec::device(FRAME_MAX_PAYLOAD);

/// Carrier of whole command frames.
pub trait FrameLink {
    type Error: fmt::Debug;

    /// Wait for the next command frame.
    fn read_command(&mut self) -> Result<Vec<u8>, Self::Error>;

    fn write_response(&mut self, response: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<E> {
    Io(E),
    /// Stream ended in the middle of a frame.
    Eof,
    Framing(LinkFault),
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Io(err) => write!(f, "serial error: {err:?}"),
            LinkError::Eof => write!(f, "serial stream ended mid-frame"),
            LinkError::Framing(err) => write!(f, "{err}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for LinkError<E> {}

impl<E> From<LinkFault> for LinkError<E> {
    fn from(value: LinkFault) -> Self {
        LinkError::Framing(value)
    }
}

impl<E> From<ReadExactError<E>> for LinkError<E> {
    fn from(value: ReadExactError<E>) -> Self {
        match value {
            ReadExactError::UnexpectedEof => LinkError::Eof,
            ReadExactError::Other(err) => LinkError::Io(err),
        }
    }
}

/// Framed command link over a byte stream.
pub struct CdcLink<T> {
    stream: T,
}

impl<T: Read + Write> CdcLink<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> T {
        self.stream
    }
}

impl<T: Read + Write> FrameLink for CdcLink<T> {
    type Error = LinkError<T::Error>;

    fn read_command(&mut self) -> Result<Vec<u8>, Self::Error> {
        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        self.stream.read_exact(&mut header_bytes)?;
        let header = DEVICE_CODEC.open(header_bytes)?;

        let mut payload = vec![0u8; header.length as usize];
        self.stream.read_exact(&mut payload)?;
        DEVICE_CODEC.verify(&header, &payload)?;
        Ok(payload)
    }

    fn write_response(&mut self, response: &[u8]) -> Result<(), Self::Error> {
        let header = DEVICE_CODEC.seal(response)?;
        self.stream.write_all(&header).map_err(LinkError::Io)?;
        if !response.is_empty() {
            self.stream.write_all(response).map_err(LinkError::Io)?;
        }
        self.stream.flush().map_err(LinkError::Io)
    }
}
