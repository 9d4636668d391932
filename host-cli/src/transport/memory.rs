use std::collections::VecDeque;

use shared::apdu::{CommandFrame, Instruction};
use shared::error::SharedError;
use shared::status::{StatusWord, encode_response};

use super::DeviceTransport;

/// Stand-in keyboard that answers from a script of replies and keeps every command it was sent.
#[derive(Default)]
pub struct MemoryDeviceTransport {
    replies: VecDeque<Vec<u8>>,
    pub commands: Vec<Vec<u8>>,
}

impl MemoryDeviceTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next reply: `data` followed by `status`.
    pub fn queue_response(&mut self, data: &[u8], status: StatusWord) {
        self.replies.push_back(encode_response(data, status));
    }

    pub fn last_sent(&self) -> Option<CommandFrame<'_>> {
        self.commands
            .last()
            .map(|command| CommandFrame::parse(command).expect("well-formed command"))
    }

    pub fn sent_instructions(&self) -> Vec<Instruction> {
        self.commands
            .iter()
            .map(|command| {
                CommandFrame::parse(command)
                    .expect("well-formed command")
                    .instruction()
                    .expect("known instruction")
            })
            .collect()
    }
}

impl DeviceTransport for MemoryDeviceTransport {
    fn send_command(&mut self, command: &[u8]) -> Result<(), SharedError> {
        self.commands.push(command.to_vec());
        Ok(())
    }

    fn receive_reply(&mut self) -> Result<Vec<u8>, SharedError> {
        self.replies
            .pop_front()
            .ok_or_else(|| SharedError::Transport("keyboard sent no reply".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_label_is_returned_for_read_next() {
        let mut keyboard = MemoryDeviceTransport::new();
        keyboard.queue_response(b"mail", StatusWord::OK);
        let label = keyboard
            .exchange(Instruction::ReadNext, &[])
            .expect("exchange");
        assert_eq!(label, b"mail");
        assert_eq!(keyboard.sent_instructions(), vec![Instruction::ReadNext]);
    }

    #[test]
    fn written_label_is_kept_as_a_command() {
        let mut keyboard = MemoryDeviceTransport::new();
        keyboard.queue_response(&[], StatusWord::OK);
        keyboard
            .exchange(Instruction::WriteLabel, b"bank")
            .expect("exchange");
        let frame = keyboard.last_sent().expect("command");
        assert_eq!(frame.instruction(), Ok(Instruction::WriteLabel));
        assert_eq!(frame.payload, b"bank");
    }

    #[test]
    fn full_log_status_becomes_shared_error() {
        let mut keyboard = MemoryDeviceTransport::new();
        keyboard.queue_response(&[], StatusWord::internal(0x01));
        match keyboard.exchange(Instruction::WriteLabel, b"x") {
            Err(SharedError::Status(status)) => assert_eq!(status.value(), 0x6801),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
