use shared::apdu::Instruction;
use shared::error::SharedError;

use crate::commands::{DeviceTransport, display_label};
use crate::constants::MAX_LIST_READS;

pub fn run<P>(port: &mut P) -> Result<(), SharedError>
where
    P: DeviceTransport + ?Sized,
{
    let labels = collect_labels(port)?;
    if labels.is_empty() {
        println!("No labels stored.");
        return Ok(());
    }
    for (index, label) in labels.iter().enumerate() {
        println!("{index:>3}  {}", display_label(label));
    }
    Ok(())
}

/// Every live label in log order.
///
/// The device keeps one browse cursor, so the cursor is first run past the end. Reading forward
/// from there starts over at the first label.
pub fn collect_labels<P>(port: &mut P) -> Result<Vec<Vec<u8>>, SharedError>
where
    P: DeviceTransport + ?Sized,
{
    read_until_end(port)?;
    let labels = read_until_end(port)?;
    log::debug!("listed {} labels", labels.len());
    Ok(labels)
}

fn read_until_end<P>(port: &mut P) -> Result<Vec<Vec<u8>>, SharedError>
where
    P: DeviceTransport + ?Sized,
{
    let mut labels = Vec::new();
    for _ in 0..MAX_LIST_READS {
        let label = port.exchange(Instruction::ReadNext, &[])?;
        if label.is_empty() {
            return Ok(labels);
        }
        labels.push(label);
    }
    Err(SharedError::Transport(format!(
        "device returned more than {MAX_LIST_READS} labels without reaching the end"
    )))
}
