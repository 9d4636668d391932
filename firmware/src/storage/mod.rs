//! Persisted device state: boot magic, keyboard layout selector and the metadata log.
//!
//! Layout of the backing store, all words little-endian:
//!
//! | offset | content |
//! |---|---|
//! | 0 | magic `0xDEAD1337` |
//! | 4 | keyboard layout selector |
//! | 8 | metadata log region |
use core::fmt;

use embedded_storage::Storage;

pub mod log;
pub mod memory;


pub use log::{Cursor, MetadataLog, Record};
pub use memory::{RamStorage, RamStorageError};

/// Marker written once the store has been formatted.
pub const STORAGE_MAGIC: u32 = 0xDEAD_1337;

pub const LAYOUT_OFFSET: u32 = 4;

pub const LOG_OFFSET: u32 = 8;

/// Size of the metadata log region.
pub const MAX_METADATA_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError<E> {
    Backend(E),
    /// No room for the record and its trailing sentinel.
    LogFull,
    /// The ordinal or offset does not address a record.
    NotFound,
    EmptyLabel,
    LabelTooLong { length: usize },
    /// The backing store cannot hold the requested layout.
    RegionTooSmall { required: usize, available: usize },
}

impl<E> From<E> for StorageError<E> {
    fn from(error: E) -> Self {
        StorageError::Backend(error)
    }
}

impl<E: fmt::Debug> fmt::Display for StorageError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(err) => write!(f, "storage backend error: {err:?}"),
            StorageError::LogFull => write!(f, "metadata log is full"),
            StorageError::NotFound => write!(f, "no such entry"),
            StorageError::EmptyLabel => write!(f, "label is empty"),
            StorageError::LabelTooLong { length } => {
                write!(f, "label of {length} bytes exceeds 255")
            }
            StorageError::RegionTooSmall {
                required,
                available,
            } => write!(
                f,
                "storage holds {available} bytes but {required} are required"
            ),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for StorageError<E> {}

/// Owned handle over everything the device persists.
pub struct DeviceStorage<S> {
    log: MetadataLog<S>,
    keyboard_layout: u32,
}

impl<S: Storage> DeviceStorage<S> {
    /// Open with the default log capacity, formatting the store if it was never initialised.
    pub fn open(backend: S) -> Result<Self, StorageError<S::Error>> {
        Self::open_with_capacity(backend, MAX_METADATA_BYTES)
    }

    pub fn open_with_capacity(
        mut backend: S,
        capacity: usize,
    ) -> Result<Self, StorageError<S::Error>> {
        let required = LOG_OFFSET as usize + capacity;
        if backend.capacity() < required {
            return Err(StorageError::RegionTooSmall {
                required,
                available: backend.capacity(),
            });
        }

        let mut word = [0u8; 4];
        backend.read(0, &mut word)?;
        if u32::from_le_bytes(word) != STORAGE_MAGIC {
            ::log::info!("storage magic missing, formatting {capacity} byte log");
            format_region(&mut backend, capacity)?;
        }

        backend.read(LAYOUT_OFFSET, &mut word)?;
        let keyboard_layout = u32::from_le_bytes(word);
        let log = MetadataLog::load(backend, LOG_OFFSET, capacity)?;
        ::log::debug!(
            "storage opened: {} live entries, layout selector {keyboard_layout}",
            log.count_live()
        );

        Ok(Self {
            log,
            keyboard_layout,
        })
    }

    pub fn keyboard_layout(&self) -> u32 {
        self.keyboard_layout
    }

    /// Persist a layout selector. Callers validate it first.
    pub fn set_keyboard_layout(&mut self, selector: u32) -> Result<(), StorageError<S::Error>> {
        self.log
            .backend_mut()
            .write(LAYOUT_OFFSET, &selector.to_le_bytes())?;
        self.keyboard_layout = selector;
        Ok(())
    }

    pub fn log(&self) -> &MetadataLog<S> {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut MetadataLog<S> {
        &mut self.log
    }

    pub fn into_backend(self) -> S {
        self.log.into_backend()
    }
}

/// Zero the layout word and the log, then write the magic so a crash leaves the store unformatted.
fn format_region<S: Storage>(backend: &mut S, capacity: usize) -> Result<(), S::Error> {
    backend.write(LAYOUT_OFFSET, &0u32.to_le_bytes())?;
    let zeros = [0u8; 64];
    let mut offset = 0usize;
    while offset < capacity {
        let chunk = (capacity - offset).min(zeros.len());
        backend.write(LOG_OFFSET + offset as u32, &zeros[..chunk])?;
        offset += chunk;
    }
    backend.write(0, &STORAGE_MAGIC.to_le_bytes())
}
