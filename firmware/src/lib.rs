#![cfg_attr(not(test), no_std)]

//! Device core of the label-derived password keyboard.
//!
//! Labels live in an append-only metadata log, passwords are re-derived on demand from the secure
//! element and typed through the HID keyboard endpoint, and host commands arrive as framed
//! requests answered with status words.

extern crate alloc;

pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod hid;
pub mod storage;
pub mod transport;

pub use config::{DeviceConfig, PasswordPolicy};
pub use dispatch::{DispatchState, Dispatcher, Fault};
