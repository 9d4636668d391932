use shared::error::SharedError;

use crate::Command;

pub use crate::transport::DeviceTransport;

pub trait TransportProvider {
    type Transport: DeviceTransport + ?Sized;

    fn connect(&self, port_path: &str) -> Result<Box<Self::Transport>, SharedError>;
}

pub mod add;
pub mod list;
pub mod next;
pub mod previous;
pub mod wipe;

pub fn run<T>(command: Command, transport: &mut T) -> Result<(), SharedError>
where
    T: DeviceTransport + ?Sized,
{
    match command {
        Command::Add { label } => add::run(transport, &label),
        Command::List => list::run(transport),
        Command::Next => next::run(transport),
        Command::Previous => previous::run(transport),
        Command::Wipe => wipe::run(transport),
    }
}

/// Render label bytes for the terminal.
pub(crate) fn display_label(label: &[u8]) -> String {
    String::from_utf8_lossy(label).into_owned()
}
