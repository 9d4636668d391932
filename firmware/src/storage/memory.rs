//! RAM-backed store for the simulator and tests.
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use embedded_storage::{ReadStorage, Storage};
use heapless::HistoryBuffer;

/// Completed writes remembered by [`RamStorage`]. Older entries are overwritten.
pub const WRITE_HISTORY_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamStorageError {
    OutOfBounds { offset: u32, length: usize },
    /// The simulated power loss hit before this write.
    Interrupted,
}

impl fmt::Display for RamStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RamStorageError::OutOfBounds { offset, length } => {
                write!(f, "access of {length} bytes at {offset} is out of bounds")
            }
            RamStorageError::Interrupted => write!(f, "write interrupted"),
        }
    }
}

impl core::error::Error for RamStorageError {}

#[derive(Clone, Default)]
pub struct RamStorage {
    bytes: Vec<u8>,
    writes_left: Option<usize>,
    writes: HistoryBuffer<(u32, usize), WRITE_HISTORY_DEPTH>,
}

impl fmt::Debug for RamStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamStorage")
            .field("size", &self.bytes.len())
            .field("writes_left", &self.writes_left)
            .field("recorded_writes", &self.writes.len())
            .finish()
    }
}

impl RamStorage {
    /// Erased store, all bytes zero.
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0u8; size])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            writes_left: None,
            writes: HistoryBuffer::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fail every write after the next `count` ones.
    pub fn interrupt_after(&mut self, count: usize) {
        self.writes_left = Some(count);
    }

    /// `(offset, length)` of the most recent completed writes, oldest first.
    pub fn writes(&self) -> Vec<(u32, usize)> {
        self.writes.oldest_ordered().copied().collect()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn range(&self, offset: u32, length: usize) -> Result<core::ops::Range<usize>, RamStorageError> {
        let start = offset as usize;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(RamStorageError::OutOfBounds { offset, length })?;
        Ok(start..end)
    }
}

impl ReadStorage for RamStorage {
    type Error = RamStorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl Storage for RamStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(RamStorageError::Interrupted);
            }
            *left -= 1;
        }
        let range = self.range(offset, bytes.len())?;
        self.bytes[range].copy_from_slice(bytes);
        self.writes.write((offset, bytes.len()));
        Ok(())
    }
}
