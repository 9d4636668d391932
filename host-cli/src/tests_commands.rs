use shared::apdu::Instruction;
use shared::error::SharedError;
use shared::status::StatusWord;

use crate::Command;
use crate::commands;
use crate::transport::memory::MemoryDeviceTransport;

#[test]
fn add_sends_the_label_as_a_write_command() {
    let mut transport = MemoryDeviceTransport::new();
    transport.queue_response(&[], StatusWord::OK);

    commands::run(
        Command::Add {
            label: "mail".into(),
        },
        &mut transport,
    )
    .expect("add succeeds");

    let frame = transport.last_sent().expect("sent command");
    assert_eq!(frame.instruction(), Ok(Instruction::WriteLabel));
    assert_eq!(frame.payload, b"mail");
}

#[test]
fn add_rejects_empty_labels_locally() {
    let mut transport = MemoryDeviceTransport::new();
    let err = commands::add::run(&mut transport, "").expect_err("empty label");
    assert!(matches!(err, SharedError::Transport(_)));
    assert!(transport.commands.is_empty());
}

#[test]
fn list_runs_the_cursor_past_the_end_first() {
    let mut transport = MemoryDeviceTransport::new();
    transport.queue_response(b"bank", StatusWord::OK);
    transport.queue_response(&[], StatusWord::OK);
    transport.queue_response(b"mail", StatusWord::OK);
    transport.queue_response(b"bank", StatusWord::OK);
    transport.queue_response(&[], StatusWord::OK);

    let labels = commands::list::collect_labels(&mut transport).expect("list");
    assert_eq!(labels, vec![b"mail".to_vec(), b"bank".to_vec()]);
    assert_eq!(
        transport.sent_instructions(),
        vec![Instruction::ReadNext; 5]
    );
}

#[test]
fn next_and_previous_send_their_instructions() {
    let mut transport = MemoryDeviceTransport::new();
    transport.queue_response(b"mail", StatusWord::OK);
    transport.queue_response(&[], StatusWord::OK);

    commands::run(Command::Next, &mut transport).expect("next");
    commands::run(Command::Previous, &mut transport).expect("previous");
    assert_eq!(
        transport.sent_instructions(),
        vec![Instruction::ReadNext, Instruction::ReadPrevious]
    );
}

#[test]
fn wipe_surfaces_device_status() {
    let mut transport = MemoryDeviceTransport::new();
    transport.queue_response(&[], StatusWord::internal(0x06));

    match commands::run(Command::Wipe, &mut transport) {
        Err(SharedError::Status(status)) => {
            assert_eq!(status.value(), 0x6806);
            assert_eq!(status.internal_code(), Some(0x06));
        }
        other => panic!("unexpected response: {other:?}"),
    }
    assert_eq!(transport.sent_instructions(), vec![Instruction::WipeAll]);
}

#[test]
fn missing_response_is_a_transport_error() {
    let mut transport = MemoryDeviceTransport::new();
    let err = commands::run(Command::Next, &mut transport).expect_err("no response");
    assert!(matches!(err, SharedError::Transport(_)));
}
