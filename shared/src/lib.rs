#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod apdu;
pub mod cdc;
#[cfg(feature = "std")]
pub mod error;
pub mod status;
