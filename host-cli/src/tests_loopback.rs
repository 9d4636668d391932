//! Host commands against the real dispatcher running on simulated hardware.
use std::collections::VecDeque;

use firmware::crypto::software::SoftwareElement;
use firmware::storage::{LOG_OFFSET, RamStorage};
use firmware::{DeviceConfig, Dispatcher};
use shared::apdu::Instruction;
use shared::error::SharedError;

use crate::commands::{self, DeviceTransport};

struct DispatcherTransport {
    dispatcher: Dispatcher<RamStorage, SoftwareElement>,
    responses: VecDeque<Vec<u8>>,
}

impl DispatcherTransport {
    fn with_capacity(log_capacity: usize) -> Self {
        let config = DeviceConfig {
            log_capacity,
            ..DeviceConfig::default()
        };
        let backend = RamStorage::new(LOG_OFFSET as usize + log_capacity);
        let dispatcher =
            Dispatcher::boot(backend, SoftwareElement::new([0x33; 32]), &config).expect("boot");
        Self {
            dispatcher,
            responses: VecDeque::new(),
        }
    }

    fn new() -> Self {
        Self::with_capacity(DeviceConfig::default().log_capacity)
    }
}

impl DeviceTransport for DispatcherTransport {
    fn send_command(&mut self, command: &[u8]) -> Result<(), SharedError> {
        let response = self.dispatcher.handle_frame(command);
        self.responses.push_back(response);
        Ok(())
    }

    fn receive_reply(&mut self) -> Result<Vec<u8>, SharedError> {
        self.responses
            .pop_front()
            .ok_or_else(|| SharedError::Transport("device produced no response".into()))
    }
}

#[test]
fn added_labels_are_listed_in_order() {
    let mut device = DispatcherTransport::new();
    for label in ["mail", "bank", "forum"] {
        commands::add::run(&mut device, label).expect("add");
    }

    let labels = commands::list::collect_labels(&mut device).expect("list");
    assert_eq!(
        labels,
        vec![b"mail".to_vec(), b"bank".to_vec(), b"forum".to_vec()]
    );

    let again = commands::list::collect_labels(&mut device).expect("list twice");
    assert_eq!(again, labels);
}

#[test]
fn browsing_moves_the_shared_cursor() {
    let mut device = DispatcherTransport::new();
    commands::add::run(&mut device, "mail").expect("add");
    commands::add::run(&mut device, "bank").expect("add");

    assert_eq!(device.exchange(Instruction::ReadNext, &[]).expect("next"), b"mail");
    assert_eq!(device.exchange(Instruction::ReadNext, &[]).expect("next"), b"bank");
    assert_eq!(
        device.exchange(Instruction::ReadPrevious, &[]).expect("previous"),
        b"mail"
    );
}

#[test]
fn wipe_leaves_nothing_to_list() {
    let mut device = DispatcherTransport::new();
    commands::add::run(&mut device, "mail").expect("add");
    commands::wipe::run(&mut device).expect("wipe");

    assert!(commands::list::collect_labels(&mut device).expect("list").is_empty());
}

#[test]
fn full_log_is_reported_with_its_fault_code() {
    let mut device = DispatcherTransport::with_capacity(16);
    commands::add::run(&mut device, "twelve bytes").expect("fits");

    match commands::add::run(&mut device, "x") {
        Err(SharedError::Status(status)) => assert_eq!(status.internal_code(), Some(0x01)),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn previous_on_a_fresh_session_shows_the_first_label() {
    let mut device = DispatcherTransport::new();
    commands::add::run(&mut device, "mail").expect("add");
    commands::add::run(&mut device, "bank").expect("add");

    assert_eq!(
        device.exchange(Instruction::ReadPrevious, &[]).expect("previous"),
        b"mail"
    );
}
