use std::collections::{HashMap, VecDeque};

use firmware::crypto::derive_password;
use firmware::crypto::software::SoftwareElement;
use firmware::hid::{HID_REPORT_SIZE, KeyboardLayout, KeyboardReport, map_char};
use firmware::hid::actions::LocalAction;
use firmware::storage::{LOG_OFFSET, RamStorage};
use firmware::transport::{
    ENDPOINT_IN, EndpointWriter, EventHandler, HidLink, LinkEvent, TransportError,
};
use firmware::{DeviceConfig, Dispatcher, PasswordPolicy};
use shared::apdu::{CommandFrame, Instruction};
use shared::status::{StatusWord, split_response};

const SEED: [u8; 32] = [0x21; 32];

/// USB stack double that acknowledges every transfer after some unrelated traffic.
struct NoisyHost {
    pending: VecDeque<LinkEvent>,
    typed: Vec<[u8; HID_REPORT_SIZE]>,
    unplug_after: Option<usize>,
}

impl NoisyHost {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            typed: Vec::new(),
            unplug_after: None,
        }
    }
}

impl HidLink for NoisyHost {
    fn prepare_in(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError> {
        let mut report = [0u8; HID_REPORT_SIZE];
        report.copy_from_slice(data);
        self.typed.push(report);

        self.pending.push_back(LinkEvent::Ticker);
        if self.unplug_after == Some(self.typed.len()) {
            self.pending.push_back(LinkEvent::Status { usb_powered: false });
            return Ok(());
        }
        self.pending.push_back(LinkEvent::Button { mask: 0 });
        self.pending.push_back(LinkEvent::TransferComplete {
            endpoint: ENDPOINT_IN | endpoint,
            length: data.len(),
        });
        Ok(())
    }

    fn next_event(&mut self) -> Result<LinkEvent, TransportError> {
        self.pending.pop_front().ok_or(TransportError::Link)
    }
}

#[derive(Default)]
struct CountingUi {
    events: usize,
}

impl EventHandler for CountingUi {
    fn handle(&mut self, _event: &LinkEvent) {
        self.events += 1;
    }
}

fn boot() -> Dispatcher<RamStorage, SoftwareElement> {
    let config = DeviceConfig::default();
    let backend = RamStorage::new(LOG_OFFSET as usize + config.log_capacity);
    Dispatcher::boot(backend, SoftwareElement::new(SEED), &config).expect("boot")
}

fn send(dispatcher: &mut Dispatcher<RamStorage, SoftwareElement>, frame: &[u8]) -> StatusWord {
    let response = dispatcher.handle_frame(frame);
    let (_, status) = split_response(&response).expect("status");
    status
}

fn write_label(dispatcher: &mut Dispatcher<RamStorage, SoftwareElement>, label: &[u8]) {
    let frame = CommandFrame::new(Instruction::WriteLabel, label)
        .encode()
        .expect("frame");
    assert_eq!(send(dispatcher, &frame), StatusWord::OK);
}

/// Text the host would see for the key presses in `typed`.
fn decode(layout: KeyboardLayout, typed: &[[u8; HID_REPORT_SIZE]]) -> Vec<u8> {
    let inverse: HashMap<(u8, u8), u8> = (0x20u8..0x7F)
        .map(|ascii| {
            let stroke = map_char(layout, ascii).expect("printable");
            ((stroke.modifiers, stroke.scan_code), ascii)
        })
        .collect();

    let mut text = Vec::new();
    for pair in typed.chunks(2) {
        let press = KeyboardReport::from_bytes(pair[0]);
        let release = KeyboardReport::from_bytes(pair[1]);
        assert!(release.is_empty(), "every press is followed by a release");
        text.push(inverse[&(press.modifiers, press.keys[0])]);
    }
    text
}

#[test]
fn typed_reports_spell_the_derived_password() {
    let mut dispatcher = boot();
    write_label(&mut dispatcher, b"mail");
    write_label(&mut dispatcher, b"bank");

    let mut host = NoisyHost::new();
    let mut ui = CountingUi::default();
    let endpoint = dispatcher.hid_endpoint();
    let mut writer = EndpointWriter::new(&mut host, &mut ui, endpoint);
    dispatcher
        .run_action(LocalAction::TypePassword { ordinal: 1 }, &mut writer)
        .expect("typed");

    let expected = derive_password(
        &mut SoftwareElement::new(SEED),
        b"bank",
        &PasswordPolicy::DEFAULT,
    )
    .expect("password");
    assert_eq!(host.typed.len(), 2 * expected.len());
    assert_eq!(decode(KeyboardLayout::Qwerty, &host.typed), expected.as_bytes());
    assert_eq!(ui.events, 2 * host.typed.len());
}

#[test]
fn layout_switch_changes_scan_codes_not_text() {
    let mut dispatcher = boot();
    write_label(&mut dispatcher, b"forum");

    let mut qwerty_host = NoisyHost::new();
    let mut ui = CountingUi::default();
    let mut writer = EndpointWriter::new(&mut qwerty_host, &mut ui, 0x01);
    dispatcher
        .run_action(LocalAction::TypePassword { ordinal: 0 }, &mut writer)
        .expect("typed");

    let mut writer = EndpointWriter::new(&mut qwerty_host, &mut ui, 0x01);
    dispatcher
        .run_action(LocalAction::SelectLayout { selector: 1 }, &mut writer)
        .expect("layout stored");
    assert_eq!(dispatcher.storage().keyboard_layout(), 1);

    let mut azerty_host = NoisyHost::new();
    let mut writer = EndpointWriter::new(&mut azerty_host, &mut ui, 0x01);
    dispatcher
        .run_action(LocalAction::TypePassword { ordinal: 0 }, &mut writer)
        .expect("typed");

    assert_eq!(
        decode(KeyboardLayout::Qwerty, &qwerty_host.typed),
        decode(KeyboardLayout::Azerty, &azerty_host.typed)
    );
    assert_ne!(qwerty_host.typed, azerty_host.typed);
}

#[test]
fn unplugging_mid_password_aborts_the_action() {
    let mut dispatcher = boot();
    write_label(&mut dispatcher, b"mail");

    let mut host = NoisyHost::new();
    host.unplug_after = Some(3);
    let mut ui = CountingUi::default();
    let mut writer = EndpointWriter::new(&mut host, &mut ui, 0x01);
    let result = dispatcher.run_action(LocalAction::TypePassword { ordinal: 0 }, &mut writer);

    assert_eq!(result, Err(TransportError::Reset));
    assert_eq!(host.typed.len(), 3);

    let frame = CommandFrame::new(Instruction::ReadNext, &[])
        .encode()
        .expect("frame");
    let response = dispatcher.handle_frame(&frame);
    assert_eq!(response, b"mail\x90\x00");
}
