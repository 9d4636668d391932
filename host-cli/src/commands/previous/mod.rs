use shared::apdu::Instruction;
use shared::error::SharedError;

use crate::commands::{DeviceTransport, display_label};

pub fn run<P>(port: &mut P) -> Result<(), SharedError>
where
    P: DeviceTransport + ?Sized,
{
    let label = port.exchange(Instruction::ReadPrevious, &[])?;
    if label.is_empty() {
        println!("Nothing before the current position.");
    } else {
        println!("{}", display_label(&label));
    }
    Ok(())
}
