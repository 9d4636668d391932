//! Append-only label log.
//!
//! Records are `[length][status][payload]` packed back to back. A zero length marks the end of
//! data. Erasing a record only flips its status byte, space comes back through [`MetadataLog::reset_all`].
//! Reads are served from a shadow copy of the region, every mutation is written through to the
//! backend first.
use alloc::vec;
use alloc::vec::Vec;

use embedded_storage::Storage;

use super::StorageError;

/// Status of a live record.
pub const META_NONE: u8 = 0x00;

/// Status of a tombstoned record.
pub const META_ERASED: u8 = 0xFF;

/// Length and status bytes.
pub const RECORD_HEADER_SIZE: usize = 2;

/// Longest label a record can carry.
pub const MAX_LABEL_LENGTH: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub offset: usize,
    pub length: u8,
    pub status: u8,
}

impl Record {
    pub fn is_live(&self) -> bool {
        self.status != META_ERASED
    }

    pub fn next_offset(&self) -> usize {
        self.offset + RECORD_HEADER_SIZE + usize::from(self.length)
    }

    fn payload_range(&self) -> core::ops::Range<usize> {
        self.offset + RECORD_HEADER_SIZE..self.next_offset()
    }
}

/// Read position of a browsing session.
///
/// `Unvisited` and `At(0)` differ: the first has not returned anything yet, the second has
/// returned the record at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Unvisited,
    At(usize),
    PastEnd,
}

pub struct MetadataLog<S> {
    backend: S,
    base: u32,
    image: Vec<u8>,
}

impl<S: Storage> MetadataLog<S> {
    /// Read the region at `base` into the shadow copy.
    pub fn load(mut backend: S, base: u32, capacity: usize) -> Result<Self, StorageError<S::Error>> {
        let mut image = vec![0u8; capacity];
        backend.read(base, &mut image)?;
        Ok(Self {
            backend,
            base,
            image,
        })
    }

    pub fn capacity(&self) -> usize {
        self.image.len()
    }

    pub(crate) fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub(crate) fn into_backend(self) -> S {
        self.backend
    }

    /// Record whose header sits at `offset`, or `None` at the end of data.
    pub fn record_at(&self, offset: usize) -> Option<Record> {
        let header = self.image.get(offset..offset.checked_add(RECORD_HEADER_SIZE)?)?;
        if header[0] == 0 {
            return None;
        }
        let record = Record {
            offset,
            length: header[0],
            status: header[1],
        };
        if record.next_offset() > self.capacity() {
            return None;
        }
        Some(record)
    }

    /// Every record, tombstones included, in log order.
    pub fn records(&self) -> Records<'_, S> {
        Records {
            log: self,
            offset: Some(0),
        }
    }

    pub fn live_records(&self) -> impl Iterator<Item = Record> + '_ {
        self.records().filter(Record::is_live)
    }

    /// Offset of the end-of-data sentinel.
    ///
    /// A header whose payload would run past the region is never treated as free space, so a
    /// damaged tail is reported as a full log instead of being overwritten.
    pub fn find_free_offset(&self) -> Result<usize, StorageError<S::Error>> {
        let mut offset = 0;
        loop {
            let Some(header) = self.image.get(offset..offset + RECORD_HEADER_SIZE) else {
                return Err(StorageError::LogFull);
            };
            if header[0] == 0 {
                return Ok(offset);
            }
            let next = offset + RECORD_HEADER_SIZE + usize::from(header[0]);
            if next > self.capacity() {
                log::warn!("record at offset {offset} overruns the log region");
                return Err(StorageError::LogFull);
            }
            offset = next;
        }
    }

    /// Append a label, returning the offset of its record.
    ///
    /// Payload and trailing sentinel are written before the header, so an interrupted append
    /// never exposes a record over unwritten bytes.
    pub fn append(&mut self, payload: &[u8]) -> Result<usize, StorageError<S::Error>> {
        if payload.is_empty() {
            return Err(StorageError::EmptyLabel);
        }
        if payload.len() > MAX_LABEL_LENGTH {
            return Err(StorageError::LabelTooLong {
                length: payload.len(),
            });
        }

        let offset = self.find_free_offset()?;
        let payload_offset = offset + RECORD_HEADER_SIZE;
        let sentinel_offset = payload_offset + payload.len();
        if sentinel_offset + RECORD_HEADER_SIZE > self.capacity() {
            return Err(StorageError::LogFull);
        }

        self.write(payload_offset, payload)?;
        self.write(sentinel_offset, &[0, META_NONE])?;
        self.write(offset, &[payload.len() as u8, META_NONE])?;
        log::debug!("appended {} byte label at offset {offset}", payload.len());
        Ok(offset)
    }

    /// Tombstone the record at `offset`. The payload stays in place.
    pub fn erase(&mut self, offset: usize) -> Result<(), StorageError<S::Error>> {
        if !self.records().any(|record| record.offset == offset) {
            return Err(StorageError::NotFound);
        }
        self.write(offset + 1, &[META_ERASED])
    }

    /// Zero the whole region, dropping live and erased records alike.
    pub fn reset_all(&mut self) -> Result<(), StorageError<S::Error>> {
        let zeros = [0u8; 64];
        let mut offset = 0;
        while offset < self.capacity() {
            let chunk = (self.capacity() - offset).min(zeros.len());
            self.write(offset, &zeros[..chunk])?;
            offset += chunk;
        }
        log::info!("metadata log reset");
        Ok(())
    }

    pub fn count_live(&self) -> usize {
        self.live_records().count()
    }

    /// Offset of the `ordinal`-th live record, counting from zero.
    pub fn nth_live(&self, ordinal: usize) -> Result<usize, StorageError<S::Error>> {
        self.live_records()
            .nth(ordinal)
            .map(|record| record.offset)
            .ok_or(StorageError::NotFound)
    }

    pub fn label(&self, record: &Record) -> &[u8] {
        &self.image[record.payload_range()]
    }

    /// Label of the record at `offset`.
    pub fn label_at(&self, offset: usize) -> Result<&[u8], StorageError<S::Error>> {
        let record = self
            .records()
            .find(|record| record.offset == offset)
            .ok_or(StorageError::NotFound)?;
        Ok(self.label(&record))
    }

    /// Move `cursor` to the next live record.
    ///
    /// Returns `None` and parks the cursor past the end once the sentinel is reached. Moving
    /// forward from past the end starts over at the first live record.
    pub fn iterate_forward(&self, cursor: &mut Cursor) -> Option<Record> {
        let next = match *cursor {
            Cursor::Unvisited | Cursor::PastEnd => self.live_records().next(),
            Cursor::At(current) => self.live_records().find(|record| record.offset > current),
        };
        *cursor = match next {
            Some(record) => Cursor::At(record.offset),
            None => Cursor::PastEnd,
        };
        next
    }

    /// Move `cursor` to the previous live record.
    ///
    /// Stays on the first live record once it is reached. An unvisited cursor also answers
    /// with the first live record but stays unvisited, so the next forward step returns that
    /// record as well.
    pub fn iterate_backward(&self, cursor: &mut Cursor) -> Option<Record> {
        let previous = match *cursor {
            Cursor::Unvisited => return self.live_records().next(),
            Cursor::PastEnd => self.live_records().last(),
            Cursor::At(current) => self
                .live_records()
                .take_while(|record| record.offset < current)
                .last()
                .or_else(|| self.live_records().next()),
        };
        *cursor = match previous {
            Some(record) => Cursor::At(record.offset),
            None => Cursor::Unvisited,
        };
        previous
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StorageError<S::Error>> {
        self.backend.write(self.base + offset as u32, bytes)?;
        self.image[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Walk over record headers, stopping at the sentinel or the end of the region.
pub struct Records<'a, S> {
    log: &'a MetadataLog<S>,
    offset: Option<usize>,
}

impl<S: Storage> Iterator for Records<'_, S> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.log.record_at(self.offset?);
        self.offset = record.map(|record| record.next_offset());
        record
    }
}
