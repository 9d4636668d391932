use crate::apdu::FrameError;
use crate::cdc::codec::LinkFault;
use crate::status::{ResponseError, StatusWord};
use alloc::string::String;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharedError {
    #[error("command frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("framing error: {0}")]
    Framing(#[from] LinkFault),
    #[error("malformed response: {0}")]
    Response(#[from] ResponseError),
    #[error("device returned status {0}")]
    Status(StatusWord),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<io::Error> for SharedError {
    fn from(value: io::Error) -> Self {
        SharedError::Transport(value.to_string())
    }
}
