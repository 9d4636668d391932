use shared::apdu::Instruction;
use shared::error::SharedError;

use crate::commands::DeviceTransport;

pub fn run<P>(port: &mut P) -> Result<(), SharedError>
where
    P: DeviceTransport + ?Sized,
{
    port.exchange(Instruction::WipeAll, &[])?;
    println!("All labels erased.");
    Ok(())
}
