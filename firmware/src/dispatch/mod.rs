//! Request/response state machine and the local password typing actions.
//!
//! Host commands arrive as `[cla][ins][p1][p2][lc][payload]` frames and are answered with the
//! response data followed by a status word. Every fault raised while processing is converted
//! into that status word here, nothing propagates past [`Dispatcher::handle_frame`].
use alloc::vec::Vec;
use core::fmt;

use embedded_storage::Storage;
use shared::apdu::{CLA, CommandFrame, FrameError, Instruction};
use shared::status::{StatusWord, encode_response};
use zeroize::Zeroize;

use crate::config::{DeviceConfig, PasswordPolicy};
use crate::crypto::{DeriveError, SecureElement, derive_password};
use crate::hid::actions::{self, LocalAction};
use crate::hid::{KeyboardLayout, KeyboardReport, KeymapError, Keystrokes};
use crate::storage::{Cursor, DeviceStorage, StorageError};
use crate::transport::{FrameLink, ReportSink, TransportError};


/// Everything that can interrupt a command or an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    EmptyFrame,
    WrongClass(u8),
    WrongLength,
    UnknownInstruction(u8),
    OutOfRange,
    UnsupportedLayout,
    UnsatisfiableConstraints,
    LogFull,
    NotFound,
    TransportReset,
    Storage,
    Element,
    Internal,
}

impl Fault {
    /// Raw fault code before status word mapping.
    pub const fn raw_code(self) -> u16 {
        match self {
            Fault::EmptyFrame => StatusWord::NO_FRAME.value(),
            Fault::WrongClass(_) => StatusWord::CLA_NOT_SUPPORTED.value(),
            Fault::WrongLength => StatusWord::WRONG_LENGTH.value(),
            Fault::UnknownInstruction(_) => StatusWord::INS_NOT_SUPPORTED.value(),
            Fault::LogFull => 0x01,
            Fault::NotFound => 0x02,
            Fault::OutOfRange => 0x03,
            Fault::UnsupportedLayout => 0x04,
            Fault::UnsatisfiableConstraints => 0x05,
            Fault::Storage => 0x06,
            Fault::Element => 0x07,
            Fault::TransportReset => 0x10,
            Fault::Internal => 0xFF,
        }
    }

    pub const fn status(self) -> StatusWord {
        StatusWord::from_raw(self.raw_code())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::EmptyFrame => write!(f, "empty frame"),
            Fault::WrongClass(class) => write!(f, "class 0x{class:02X} not supported"),
            Fault::WrongLength => write!(f, "wrong length"),
            Fault::UnknownInstruction(ins) => write!(f, "instruction 0x{ins:02X} not supported"),
            Fault::OutOfRange => write!(f, "character outside the printable range"),
            Fault::UnsupportedLayout => write!(f, "unsupported keyboard layout"),
            Fault::UnsatisfiableConstraints => write!(f, "password policy cannot be satisfied"),
            Fault::LogFull => write!(f, "metadata log full"),
            Fault::NotFound => write!(f, "entry not found"),
            Fault::TransportReset => write!(f, "transport reset"),
            Fault::Storage => write!(f, "storage failure"),
            Fault::Element => write!(f, "secure element failure"),
            Fault::Internal => write!(f, "internal error"),
        }
    }
}

impl core::error::Error for Fault {}

impl From<FrameError> for Fault {
    fn from(_: FrameError) -> Self {
        Fault::WrongLength
    }
}

impl From<KeymapError> for Fault {
    fn from(value: KeymapError) -> Self {
        match value {
            KeymapError::OutOfRange(_) | KeymapError::TooLong(_) => Fault::OutOfRange,
            KeymapError::UnsupportedLayout(_) => Fault::UnsupportedLayout,
        }
    }
}

impl From<DeriveError> for Fault {
    fn from(value: DeriveError) -> Self {
        match value {
            DeriveError::Element(_) => Fault::Element,
            DeriveError::UnsatisfiableConstraints { .. } => Fault::UnsatisfiableConstraints,
        }
    }
}

impl<E> From<StorageError<E>> for Fault {
    fn from(value: StorageError<E>) -> Self {
        match value {
            StorageError::LogFull => Fault::LogFull,
            StorageError::NotFound => Fault::NotFound,
            StorageError::EmptyLabel | StorageError::LabelTooLong { .. } => Fault::WrongLength,
            StorageError::Backend(_) | StorageError::RegionTooSmall { .. } => Fault::Storage,
        }
    }
}

impl From<TransportError> for Fault {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Reset => Fault::TransportReset,
            TransportError::Link => Fault::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Receiving,
    Processing,
    RespondedOk,
    RespondedError,
}

/// Single owner of the persisted state, the secure element and the browse cursor.
pub struct Dispatcher<S, E> {
    storage: DeviceStorage<S>,
    element: E,
    hid_endpoint: u8,
    cursor: Cursor,
    state: DispatchState,
}

impl<S, E> Dispatcher<S, E>
where
    S: Storage,
    S::Error: fmt::Debug,
    E: SecureElement,
{
    pub fn new(storage: DeviceStorage<S>, element: E, config: &DeviceConfig) -> Self {
        Self {
            storage,
            element,
            hid_endpoint: config.hid_endpoint,
            cursor: Cursor::Unvisited,
            state: DispatchState::Idle,
        }
    }

    /// Open `backend` with the configured log size, formatting it on first boot.
    pub fn boot(backend: S, element: E, config: &DeviceConfig) -> Result<Self, StorageError<S::Error>> {
        let storage = DeviceStorage::open_with_capacity(backend, config.log_capacity)?;
        Ok(Self::new(storage, element, config))
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn storage(&self) -> &DeviceStorage<S> {
        &self.storage
    }

    pub fn hid_endpoint(&self) -> u8 {
        self.hid_endpoint
    }

    pub fn into_parts(self) -> (DeviceStorage<S>, E) {
        (self.storage, self.element)
    }

    /// Receive one frame from `link`, process it and send the response.
    pub fn serve_next<L: FrameLink>(&mut self, link: &mut L) -> Result<(), L::Error> {
        self.state = DispatchState::Receiving;
        let frame = match link.read_command() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("command link read failed: {err:?}");
                self.state = DispatchState::Idle;
                return Err(err);
            }
        };
        let response = self.handle_frame(&frame);
        let result = link.write_response(&response);
        self.state = DispatchState::Idle;
        result
    }

    /// Process a raw command frame and build the response: data then status word.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Vec<u8> {
        self.state = DispatchState::Processing;
        match self.process(frame) {
            Ok(data) => {
                self.state = DispatchState::RespondedOk;
                encode_response(&data, StatusWord::OK)
            }
            Err(fault) => {
                log::warn!("command failed: {fault}");
                self.state = DispatchState::RespondedError;
                encode_response(&[], fault.status())
            }
        }
    }

    fn process(&mut self, bytes: &[u8]) -> Result<Vec<u8>, Fault> {
        let class = *bytes.first().ok_or(Fault::EmptyFrame)?;
        if class != CLA {
            return Err(Fault::WrongClass(class));
        }
        let frame = CommandFrame::parse(bytes)?;
        let instruction = frame.instruction().map_err(Fault::UnknownInstruction)?;
        log::debug!("processing {instruction:?} with {} byte payload", frame.payload.len());

        match instruction {
            Instruction::WriteLabel => {
                self.storage.log_mut().append(frame.payload)?;
                Ok(Vec::new())
            }
            Instruction::ReadNext => {
                let entries = self.storage.log();
                Ok(entries
                    .iterate_forward(&mut self.cursor)
                    .map(|record| entries.label(&record).to_vec())
                    .unwrap_or_default())
            }
            Instruction::ReadPrevious => {
                let entries = self.storage.log();
                Ok(entries
                    .iterate_backward(&mut self.cursor)
                    .map(|record| entries.label(&record).to_vec())
                    .unwrap_or_default())
            }
            Instruction::WipeAll => {
                self.reset_all()?;
                Ok(Vec::new())
            }
        }
    }

    /// Derive the password of the `ordinal`-th live entry and type it on `sink`.
    ///
    /// Every character is mapped before the first report goes out. Each key press is followed by
    /// an empty report so the host sees a release between characters.
    pub fn type_password<K: ReportSink>(&mut self, ordinal: usize, sink: &mut K) -> Result<(), Fault> {
        let entries = self.storage.log();
        let offset = entries.nth_live(ordinal)?;
        let label = entries.label_at(offset)?;
        let layout = KeyboardLayout::from_selector(self.storage.keyboard_layout())?;

        let password = derive_password(&mut self.element, label, &PasswordPolicy::DEFAULT)?;
        let keystrokes = Keystrokes::map(layout, password.as_bytes())?;
        drop(password);

        let released = KeyboardReport::empty();
        for stroke in keystrokes.iter() {
            let mut pressed = stroke.report();
            let sent = sink.send_report(&pressed);
            pressed.zeroize();
            sent?;
            sink.send_report(&released)?;
        }
        log::info!("typed {} characters for entry {ordinal}", keystrokes.len());
        Ok(())
    }

    /// Tombstone the `ordinal`-th live entry.
    pub fn erase_entry(&mut self, ordinal: usize) -> Result<(), Fault> {
        let entries = self.storage.log_mut();
        let offset = entries.nth_live(ordinal)?;
        entries.erase(offset)?;
        log::info!("erased entry {ordinal} at offset {offset}");
        Ok(())
    }

    pub fn reset_all(&mut self) -> Result<(), Fault> {
        self.storage.log_mut().reset_all()?;
        self.cursor = Cursor::Unvisited;
        Ok(())
    }

    /// Validate and persist a keyboard layout selector.
    pub fn select_layout(&mut self, selector: u32) -> Result<(), Fault> {
        let layout = KeyboardLayout::from_selector(selector)?;
        self.storage.set_keyboard_layout(selector)?;
        log::info!("keyboard layout set to {layout:?}");
        Ok(())
    }

    /// Run one local action. Faults are logged and dropped, only a link reset is returned.
    pub fn run_action<K: ReportSink>(
        &mut self,
        action: LocalAction,
        sink: &mut K,
    ) -> Result<(), TransportError> {
        let result = match action {
            LocalAction::TypePassword { ordinal } => self.type_password(ordinal, sink),
            LocalAction::EraseEntry { ordinal } => self.erase_entry(ordinal),
            LocalAction::ResetAll => self.reset_all(),
            LocalAction::SelectLayout { selector } => self.select_layout(selector),
        };
        match result {
            Ok(()) => Ok(()),
            Err(Fault::TransportReset) => {
                log::warn!("{action:?} aborted by transport reset");
                Err(TransportError::Reset)
            }
            Err(fault) => {
                log::warn!("{action:?} failed: {fault}");
                Ok(())
            }
        }
    }

    /// Drain the local action queue.
    pub fn run_pending_actions<K: ReportSink>(&mut self, sink: &mut K) -> Result<(), TransportError> {
        while let Some(action) = actions::next_pending() {
            self.run_action(action, sink)?;
        }
        Ok(())
    }
}
