use shared::apdu::Instruction;
use shared::cdc::FrameKind;
use shared::cdc::codec::LinkFault;
use shared::error::SharedError;
use shared::status::StatusWord;

use crate::discovery::{PortMatch, choose_port, keyboard_not_found, rank_port};
use crate::test_support::{
    SerialLoopback, adapter_port, builtin_uart, keyboard_port, keyboard_reply,
};
use crate::transport::{DeviceTransport, HOST_CODEC};

#[test]
fn keyboard_is_found_among_other_ports() {
    let ports = vec![
        builtin_uart("/dev/ttyS0"),
        adapter_port("/dev/ttyUSB0"),
        keyboard_port("/dev/ttyACM0", None),
    ];

    let detected = choose_port(&ports, false).expect("keyboard port");
    assert_eq!(detected.port_name, "/dev/ttyACM0");
}

#[test]
fn named_keyboard_beats_bare_ids() {
    let ports = vec![
        keyboard_port("/dev/ttyACM0", Some("Generic CDC")),
        keyboard_port("/dev/ttyACM1", Some("LabelPass Keyboard")),
    ];

    assert_eq!(rank_port(&ports[0], false), Some(PortMatch::KeyboardIds));
    assert_eq!(rank_port(&ports[1], false), Some(PortMatch::NamedKeyboard));
    let detected = choose_port(&ports, false).expect("keyboard port");
    assert_eq!(detected.port_name, "/dev/ttyACM1");
}

#[test]
fn first_of_two_identical_keyboards_wins() {
    let ports = vec![
        keyboard_port("/dev/ttyACM3", None),
        keyboard_port("/dev/ttyACM4", None),
    ];
    let detected = choose_port(&ports, false).expect("keyboard port");
    assert_eq!(detected.port_name, "/dev/ttyACM3");
}

#[test]
fn adapters_are_only_tried_with_any_port() {
    let ports = vec![builtin_uart("/dev/ttyS0"), adapter_port("/dev/ttyUSB0")];

    assert!(choose_port(&ports, false).is_none());
    let detected = choose_port(&ports, true).expect("usb port");
    assert_eq!(detected.port_name, "/dev/ttyUSB0");
    assert_eq!(rank_port(&ports[0], true), None);
}

#[test]
fn any_port_still_prefers_the_keyboard() {
    let ports = vec![
        adapter_port("/dev/ttyUSB0"),
        keyboard_port("/dev/ttyACM0", None),
    ];
    let detected = choose_port(&ports, true).expect("keyboard port");
    assert_eq!(detected.port_name, "/dev/ttyACM0");
}

#[test]
fn missing_keyboard_suggests_any_port_once() {
    match keyboard_not_found(false) {
        SharedError::Transport(message) => {
            assert!(message.contains("1209:5057"), "{message}");
            assert!(message.contains("--any-port"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    match keyboard_not_found(true) {
        SharedError::Transport(message) => assert!(!message.contains("--any-port"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn labels_travel_in_command_frames() {
    let mut port = SerialLoopback::replying(keyboard_reply(&[], StatusWord::OK));
    let data = port
        .exchange(Instruction::WriteLabel, b"mail")
        .expect("stored");
    assert!(data.is_empty());
    assert_eq!(
        port.sent_commands(),
        vec![(Instruction::WriteLabel, b"mail".to_vec())]
    );
}

#[test]
fn read_next_returns_the_label_without_status() {
    let mut replies = keyboard_reply(b"bank", StatusWord::OK);
    replies.extend(keyboard_reply(&[], StatusWord::OK));
    let mut port = SerialLoopback::replying(replies);

    assert_eq!(port.exchange(Instruction::ReadNext, &[]).expect("label"), b"bank");
    assert!(port.exchange(Instruction::ReadNext, &[]).expect("end").is_empty());
    assert_eq!(
        port.sent_commands(),
        vec![(Instruction::ReadNext, Vec::new()); 2]
    );
}

#[test]
fn echoed_command_frame_is_refused() {
    let body = b"\x90\x00";
    let mut bytes = HOST_CODEC.seal(body).expect("seal").to_vec();
    bytes.extend_from_slice(body);

    let mut port = SerialLoopback::replying(bytes);
    let err = port
        .exchange(Instruction::WipeAll, &[])
        .expect_err("direction mismatch");
    assert!(matches!(
        err,
        SharedError::Framing(LinkFault::WrongDirection {
            found: FrameKind::Command
        })
    ));
}

#[test]
fn full_log_refusal_keeps_its_status_word() {
    let mut port = SerialLoopback::replying(keyboard_reply(&[], StatusWord::internal(0x01)));
    match port.exchange(Instruction::WriteLabel, b"forum") {
        Err(SharedError::Status(status)) => assert_eq!(status.internal_code(), Some(0x01)),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn truncated_reply_names_the_failing_step() {
    let mut bytes = keyboard_reply(b"mail", StatusWord::OK);
    bytes.truncate(bytes.len() - 3);

    let mut port = SerialLoopback::replying(bytes);
    match port.exchange(Instruction::ReadNext, &[]) {
        Err(SharedError::Transport(message)) => {
            assert!(message.starts_with("reading the reply body"), "{message}");
            assert!(message.ends_with("(port closed mid-frame)"), "{message}");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn silent_keyboard_fails_while_waiting() {
    let mut port = SerialLoopback::replying(Vec::new());
    match port.exchange(Instruction::ReadPrevious, &[]) {
        Err(SharedError::Transport(message)) => {
            assert!(message.starts_with("waiting for the keyboard"), "{message}")
        }
        other => panic!("unexpected response: {other:?}"),
    }
    assert_eq!(port.sent_commands().len(), 1);
}
