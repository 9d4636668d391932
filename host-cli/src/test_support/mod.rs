//! Keyboard-side fixtures for the host tests.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

use serialport::{SerialPortInfo, SerialPortType, UsbPortInfo};
use shared::apdu::{CommandFrame, Instruction};
use shared::cdc::codec::LinkCodec;
use shared::cdc::{FRAME_HEADER_SIZE, FRAME_MAX_PAYLOAD};
use shared::error::SharedError;
use shared::status::{StatusWord, encode_response};

use crate::commands::TransportProvider;
use crate::constants::{DEVICE_USB_PID, DEVICE_USB_VID};
use crate::transport::memory::MemoryDeviceTransport;

/// The keyboard's end of the link.
const KEYBOARD: LinkCodec = LinkCodec::device(FRAME_MAX_PAYLOAD);

fn usb_port(name: &str, vid: u16, pid: u16, product: Option<&str>) -> SerialPortInfo {
    SerialPortInfo {
        port_name: name.to_string(),
        port_type: SerialPortType::UsbPort(UsbPortInfo {
            vid,
            pid,
            serial_number: None,
            manufacturer: None,
            product: product.map(str::to_string),
            interface: None,
        }),
    }
}

/// Port enumerated with the keyboard's VID/PID.
pub(crate) fn keyboard_port(name: &str, product: Option<&str>) -> SerialPortInfo {
    usb_port(name, DEVICE_USB_VID, DEVICE_USB_PID, product)
}

/// A CP210x USB serial adapter.
pub(crate) fn adapter_port(name: &str) -> SerialPortInfo {
    usb_port(name, 0x10C4, 0xEA60, Some("CP210x UART Bridge"))
}

pub(crate) fn builtin_uart(name: &str) -> SerialPortInfo {
    SerialPortInfo {
        port_name: name.to_string(),
        port_type: SerialPortType::PciPort,
    }
}

/// Reply bytes exactly as the keyboard puts them on the wire.
pub(crate) fn keyboard_reply(data: &[u8], status: StatusWord) -> Vec<u8> {
    let body = encode_response(data, status);
    let mut frame = KEYBOARD.seal(&body).expect("seal reply").to_vec();
    frame.extend_from_slice(&body);
    frame
}

/// Connects to a scripted keyboard and remembers which ports were opened.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    pub(crate) opened: RefCell<Vec<String>>,
    replies: Vec<(Vec<u8>, StatusWord)>,
}

impl ScriptedProvider {
    pub(crate) fn replying(replies: &[(&[u8], StatusWord)]) -> Self {
        Self {
            opened: RefCell::default(),
            replies: replies
                .iter()
                .map(|(data, status)| (data.to_vec(), *status))
                .collect(),
        }
    }
}

impl TransportProvider for ScriptedProvider {
    type Transport = MemoryDeviceTransport;

    fn connect(&self, port_path: &str) -> Result<Box<Self::Transport>, SharedError> {
        self.opened.borrow_mut().push(port_path.to_string());
        let mut keyboard = MemoryDeviceTransport::new();
        for (data, status) in &self.replies {
            keyboard.queue_response(data, *status);
        }
        Ok(Box::new(keyboard))
    }
}

/// Serial port stand-in: plays back scripted keyboard bytes and keeps what the host wrote.
pub(crate) struct SerialLoopback {
    from_keyboard: VecDeque<u8>,
    pub(crate) to_keyboard: Vec<u8>,
}

impl SerialLoopback {
    pub(crate) fn replying(bytes: Vec<u8>) -> Self {
        Self {
            from_keyboard: bytes.into(),
            to_keyboard: Vec::new(),
        }
    }

    /// Commands the host wrote, unframed and parsed the way the keyboard would.
    pub(crate) fn sent_commands(&self) -> Vec<(Instruction, Vec<u8>)> {
        let mut rest = self.to_keyboard.as_slice();
        let mut commands = Vec::new();
        while !rest.is_empty() {
            let (header, tail) = rest.split_at(FRAME_HEADER_SIZE);
            let header = KEYBOARD
                .open(header.try_into().expect("full header"))
                .expect("command header");
            let (body, tail) = tail.split_at(header.length as usize);
            KEYBOARD.verify(&header, body).expect("intact command");
            let frame = CommandFrame::parse(body).expect("command frame");
            commands.push((
                frame.instruction().expect("known instruction"),
                frame.payload.to_vec(),
            ));
            rest = tail;
        }
        commands
    }
}

impl Read for SerialLoopback {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.from_keyboard.read(buf)
    }
}

impl Write for SerialLoopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.to_keyboard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
