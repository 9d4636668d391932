use shared::error::SharedError;
use shared::status::StatusWord;

use crate::application::{self, describe_failure, status_hint};
use crate::test_support::ScriptedProvider;
use crate::{Cli, Command};

fn cli_on(port: &str, command: Command) -> Cli {
    Cli {
        port: Some(port.into()),
        any_port: false,
        verbose: 0,
        command,
    }
}

#[test]
fn explicit_port_skips_detection() {
    let provider = ScriptedProvider::replying(&[(&b"mail"[..], StatusWord::OK)]);

    application::execute(cli_on("/dev/ttyTEST", Command::Next), &provider).expect("next");
    assert_eq!(provider.opened.borrow().as_slice(), ["/dev/ttyTEST"]);
}

#[test]
fn refused_write_reaches_the_caller() {
    let provider = ScriptedProvider::replying(&[(&b""[..], StatusWord::internal(0x01))]);

    let err = application::execute(
        cli_on(
            "/dev/ttyACM0",
            Command::Add {
                label: "forum".into(),
            },
        ),
        &provider,
    )
    .expect_err("log full");
    assert!(matches!(err, SharedError::Status(status) if status.value() == 0x6801));
}

#[test]
fn full_log_hint_points_at_wipe() {
    let hint = status_hint(StatusWord::internal(0x01)).expect("hint");
    assert!(hint.contains("wipe"), "{hint}");
    assert_eq!(
        status_hint(StatusWord::internal(0x03)),
        Some("a password character has no key in the selected layout")
    );
}

#[test]
fn unknown_faults_have_no_hint() {
    assert_eq!(status_hint(StatusWord::internal(0x42)), None);
    assert_eq!(status_hint(StatusWord::from_raw(0x6A80)), None);
}

#[test]
fn failures_are_described_by_kind() {
    let length = describe_failure(&SharedError::Status(StatusWord::WRONG_LENGTH));
    assert!(length.starts_with("Keyboard refused"), "{length}");
    assert!(length.ends_with("labels must be 1 to 255 bytes"), "{length}");

    let unplugged = describe_failure(&SharedError::Transport("cannot open /dev/ttyACM0".into()));
    assert!(unplugged.starts_with("Transport failure"), "{unplugged}");
}
