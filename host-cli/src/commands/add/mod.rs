use shared::apdu::{Instruction, MAX_COMMAND_PAYLOAD};
use shared::error::SharedError;

use crate::commands::DeviceTransport;

pub fn run<P>(port: &mut P, label: &str) -> Result<(), SharedError>
where
    P: DeviceTransport + ?Sized,
{
    if label.is_empty() || label.len() > MAX_COMMAND_PAYLOAD {
        return Err(SharedError::Transport(format!(
            "label must be 1 to {MAX_COMMAND_PAYLOAD} bytes, got {}",
            label.len()
        )));
    }

    port.exchange(Instruction::WriteLabel, label.as_bytes())?;
    println!("Stored label '{label}'.");
    Ok(())
}
