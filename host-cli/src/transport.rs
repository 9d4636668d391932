//! Command/response exchange with the keyboard over its CDC serial port.
use std::io::{self, Read, Write};

use shared::apdu::{CommandFrame, Instruction};
use shared::cdc::FRAME_HEADER_SIZE;
use shared::cdc::codec::LinkCodec;
use shared::error::SharedError;
use shared::status::split_response;

use crate::constants::HOST_BUFFER_SIZE;

#[cfg(test)]
pub mod memory;

/// Host end of the link.
pub const HOST_CODEC: LinkCodec = LinkCodec::host(HOST_BUFFER_SIZE);

/// Carries one command to the keyboard and brings its reply back.
pub trait DeviceTransport {
    fn send_command(&mut self, command: &[u8]) -> Result<(), SharedError>;

    /// Raw reply: response data followed by the status word.
    fn receive_reply(&mut self) -> Result<Vec<u8>, SharedError>;

    /// Run `instruction` and return the reply data, failing on any status but success.
    fn exchange(
        &mut self,
        instruction: Instruction,
        payload: &[u8],
    ) -> Result<Vec<u8>, SharedError> {
        let command = CommandFrame::new(instruction, payload).encode()?;
        self.send_command(&command)?;
        let reply = self.receive_reply()?;
        let (data, status) = split_response(&reply)?;
        log::debug!("{instruction:?} -> {status}, {} data bytes", data.len());
        if !status.is_success() {
            return Err(SharedError::Status(status));
        }
        Ok(data.to_vec())
    }
}

impl<T> DeviceTransport for T
where
    T: Read + Write + ?Sized,
{
    fn send_command(&mut self, command: &[u8]) -> Result<(), SharedError> {
        let header = HOST_CODEC.seal(command)?;
        self.write_all(&header)
            .map_err(link_error(Step::SendHeader))?;
        self.write_all(command)
            .map_err(link_error(Step::SendCommand))?;
        self.flush().map_err(link_error(Step::Flush))
    }

    fn receive_reply(&mut self) -> Result<Vec<u8>, SharedError> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.read_exact(&mut header)
            .map_err(link_error(Step::AwaitReply))?;
        let header = HOST_CODEC.open(header)?;

        let mut reply = vec![0u8; header.length as usize];
        self.read_exact(&mut reply)
            .map_err(link_error(Step::ReadReply))?;
        HOST_CODEC.verify(&header, &reply)?;
        Ok(reply)
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    SendHeader,
    SendCommand,
    Flush,
    AwaitReply,
    ReadReply,
}

impl Step {
    fn describe(self) -> &'static str {
        match self {
            Step::SendHeader => "sending the command header",
            Step::SendCommand => "sending the command body",
            Step::Flush => "flushing the command",
            Step::AwaitReply => "waiting for the keyboard to answer",
            Step::ReadReply => "reading the reply body",
        }
    }
}

fn link_error(step: Step) -> impl Fn(io::Error) -> SharedError {
    move |err| {
        let hint = match err.kind() {
            io::ErrorKind::TimedOut => " (no answer before the serial timeout)",
            io::ErrorKind::UnexpectedEof => " (port closed mid-frame)",
            _ => "",
        };
        SharedError::Transport(format!("{} failed: {err}{hint}", step.describe()))
    }
}
