//! Finding and opening the keyboard's CDC serial port.
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType, UsbPortInfo};
use shared::error::SharedError;

use crate::constants::{
    DEFAULT_TIMEOUT_SECS, DEVICE_IDENTITY_KEYWORDS, DEVICE_USB_PID, DEVICE_USB_VID,
    SERIAL_BAUD_RATE,
};

/// How closely a port resembles the password keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortMatch {
    /// Some other USB serial device, only considered with `--any-port`.
    ForeignUsb,
    /// Keyboard VID/PID.
    KeyboardIds,
    /// Keyboard VID/PID and a descriptor string naming the product.
    NamedKeyboard,
}

pub fn rank_port(info: &SerialPortInfo, allow_any_port: bool) -> Option<PortMatch> {
    let SerialPortType::UsbPort(usb) = &info.port_type else {
        return None;
    };
    if usb.vid != DEVICE_USB_VID || usb.pid != DEVICE_USB_PID {
        return allow_any_port.then_some(PortMatch::ForeignUsb);
    }
    if names_the_keyboard(usb) {
        Some(PortMatch::NamedKeyboard)
    } else {
        Some(PortMatch::KeyboardIds)
    }
}

fn names_the_keyboard(usb: &UsbPortInfo) -> bool {
    [&usb.product, &usb.serial_number, &usb.manufacturer]
        .into_iter()
        .flatten()
        .any(|field| {
            let field = field.to_ascii_lowercase();
            DEVICE_IDENTITY_KEYWORDS
                .iter()
                .any(|keyword| field.contains(keyword))
        })
}

/// Best-ranked port. The earliest one wins a tie.
pub fn choose_port(ports: &[SerialPortInfo], allow_any_port: bool) -> Option<&SerialPortInfo> {
    let mut best: Option<(PortMatch, &SerialPortInfo)> = None;
    for info in ports {
        let Some(rank) = rank_port(info, allow_any_port) else {
            continue;
        };
        if best.is_none_or(|(current, _)| rank > current) {
            best = Some((rank, info));
        }
    }
    best.map(|(_, info)| info)
}

pub fn locate_keyboard(allow_any_port: bool) -> Result<String, SharedError> {
    let ports = serialport::available_ports()
        .map_err(|err| SharedError::Transport(format!("cannot list serial ports: {err}")))?;
    log::debug!("{} serial ports present", ports.len());
    choose_port(&ports, allow_any_port)
        .map(|info| info.port_name.clone())
        .ok_or_else(|| keyboard_not_found(allow_any_port))
}

pub fn keyboard_not_found(allow_any_port: bool) -> SharedError {
    let mut message = format!(
        "no password keyboard attached (looked for USB {DEVICE_USB_VID:04x}:{DEVICE_USB_PID:04x})"
    );
    if !allow_any_port {
        message.push_str("; pass --any-port to try any USB serial device");
    }
    SharedError::Transport(message)
}

pub fn open_keyboard(path: &str) -> Result<Box<dyn SerialPort>, SharedError> {
    serialport::new(path, SERIAL_BAUD_RATE)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .open()
        .map_err(|err| SharedError::Transport(format!("cannot open keyboard port {path}: {err}")))
}
