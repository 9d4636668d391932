use serialport::SerialPort;
use shared::error::SharedError;
use shared::status::StatusWord;

use crate::Cli;
use crate::commands::{self, TransportProvider};
use crate::discovery;

/// Opens the keyboard's real serial port.
pub struct SerialTransportProvider;

impl TransportProvider for SerialTransportProvider {
    type Transport = dyn SerialPort;

    fn connect(&self, port_path: &str) -> Result<Box<Self::Transport>, SharedError> {
        discovery::open_keyboard(port_path)
    }
}

/// Port named on the command line, else the best detected keyboard.
pub fn resolve_port(cli: &Cli) -> Result<String, SharedError> {
    if let Some(port) = &cli.port {
        return Ok(port.clone());
    }
    let port = discovery::locate_keyboard(cli.any_port)?;
    log::info!("password keyboard detected on {port}");
    Ok(port)
}

pub fn execute<P>(cli: Cli, transport_provider: &P) -> Result<(), SharedError>
where
    P: TransportProvider,
{
    let port = resolve_port(&cli)?;
    let mut transport = transport_provider.connect(&port)?;
    commands::run(cli.command, &mut *transport)
}

/// What the user can do about a refused command.
pub fn status_hint(status: StatusWord) -> Option<&'static str> {
    if let Some(code) = status.internal_code() {
        return match code {
            0x01 => Some("the label log is full, run `wipe` to start over"),
            0x02 => Some("no label at that position"),
            0x03 => Some("a password character has no key in the selected layout"),
            0x04 => Some("the keyboard does not support the selected layout"),
            0x05 => Some("the password policy cannot be satisfied"),
            0x06 => Some("the keyboard's flash storage failed"),
            0x07 => Some("the secure element did not answer"),
            _ => None,
        };
    }
    match status {
        StatusWord::WRONG_LENGTH => Some("labels must be 1 to 255 bytes"),
        StatusWord::CLA_NOT_SUPPORTED | StatusWord::INS_NOT_SUPPORTED => {
            Some("host tool and firmware disagree on the command set")
        }
        StatusWord::NO_FRAME => Some("the keyboard received an empty command"),
        _ => None,
    }
}

/// One-line report of `err` for the terminal.
pub fn describe_failure(err: &SharedError) -> String {
    match err {
        SharedError::Transport(_) => format!("Transport failure: {err}"),
        SharedError::Status(status) => match status_hint(*status) {
            Some(hint) => format!("Keyboard refused the command with status {status}: {hint}"),
            None => format!("Keyboard refused the command with status {status}"),
        },
        SharedError::Frame(_) | SharedError::Framing(_) | SharedError::Response(_) => {
            format!("Protocol error: {err}")
        }
    }
}
