//! Queue of user-triggered actions waiting for the dispatcher.
//!
//! Menu handlers run inside the HID event pump, so they cannot call back into the dispatcher.
//! They publish here instead and the top-level loop drains the queue between frames.
#[cfg(test)]
use alloc::vec::Vec;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

type QueueMutex = CriticalSectionRawMutex;

const ACTION_QUEUE_DEPTH: usize = 8;

static ACTION_CHANNEL: Channel<QueueMutex, LocalAction, ACTION_QUEUE_DEPTH> = Channel::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    /// Derive and type the password of the `ordinal`-th live entry.
    TypePassword { ordinal: usize },
    /// Tombstone the `ordinal`-th live entry.
    EraseEntry { ordinal: usize },
    /// Drop every entry.
    ResetAll,
    /// Persist a new keyboard layout selector.
    SelectLayout { selector: u32 },
}

pub type ActionSender = Sender<'static, QueueMutex, LocalAction, ACTION_QUEUE_DEPTH>;
pub type ActionReceiver = Receiver<'static, QueueMutex, LocalAction, ACTION_QUEUE_DEPTH>;

pub fn action_sender() -> ActionSender {
    ACTION_CHANNEL.sender()
}

pub fn action_receiver() -> ActionReceiver {
    ACTION_CHANNEL.receiver()
}

/// Queue an action, dropping it when the queue is already full.
pub fn publish(action: LocalAction) -> bool {
    match action_sender().try_send(action) {
        Ok(()) => true,
        Err(_) => {
            log::warn!("action queue full, dropping {action:?}");
            false
        }
    }
}

/// Pop the oldest pending action.
pub fn next_pending() -> Option<LocalAction> {
    action_receiver().try_receive().ok()
}

#[cfg(test)]
pub fn clear() {
    let receiver = action_receiver();
    while receiver.try_receive().is_ok() {}
}

#[cfg(test)]
pub fn drain() -> Vec<LocalAction> {
    let receiver = action_receiver();
    let mut collected = Vec::new();
    while let Ok(action) = receiver.try_receive() {
        collected.push(action);
    }
    collected
}
