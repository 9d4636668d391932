//! Link abstractions between the dispatcher and the USB stack.
//!
//! Keyboard reports are pushed with a nested event pump: after arming the IN endpoint the writer
//! keeps pulling link events, forwarding everything that is not its acknowledgement to an
//! [`EventHandler`], until the transfer completes or the link resets.
pub mod cdc;

pub use cdc::{CdcLink, FrameLink, LinkError};

use core::fmt;

use zeroize::Zeroize;

use crate::hid::{HID_REPORT_SIZE, KeyboardReport};

/// Direction bit of an IN endpoint address.
pub const ENDPOINT_IN: u8 = 0x80;

/// Low-level events raised by the USB stack and the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    TransferComplete { endpoint: u8, length: usize },
    Status { usb_powered: bool },
    BusReset,
    Button { mask: u8 },
    DisplayReady,
    Ticker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The host went away. The in-flight operation is abandoned.
    Reset,
    /// The link failed to arm or poll an endpoint.
    Link,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Reset => write!(f, "link reset or disconnected"),
            TransportError::Link => write!(f, "link failure"),
        }
    }
}

impl core::error::Error for TransportError {}

/// USB device side of the keyboard interface.
pub trait HidLink {
    /// Arm `endpoint` with `data` for the next IN transfer.
    fn prepare_in(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError>;

    /// Block until the next link event.
    fn next_event(&mut self) -> Result<LinkEvent, TransportError>;
}

/// Receiver of events that arrive while a transfer is pending.
pub trait EventHandler {
    fn handle(&mut self, event: &LinkEvent);
}

/// Handler that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn handle(&mut self, _event: &LinkEvent) {}
}

/// Destination of typed keyboard reports.
pub trait ReportSink {
    fn send_report(&mut self, report: &KeyboardReport) -> Result<(), TransportError>;
}

/// Sends reports on one endpoint and waits for each to be acknowledged.
pub struct EndpointWriter<'a, L, H> {
    link: &'a mut L,
    handler: &'a mut H,
    endpoint: u8,
}

impl<'a, L: HidLink, H: EventHandler> EndpointWriter<'a, L, H> {
    pub fn new(link: &'a mut L, handler: &'a mut H, endpoint: u8) -> Self {
        Self {
            link,
            handler,
            endpoint,
        }
    }

    /// Arm the endpoint and pump events until the host has taken `data`.
    pub fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.link.prepare_in(self.endpoint, data)?;
        let expected = ENDPOINT_IN | self.endpoint;
        loop {
            let event = self.link.next_event()?;
            match event {
                LinkEvent::TransferComplete { endpoint, length }
                    if endpoint == expected && length == data.len() =>
                {
                    return Ok(());
                }
                LinkEvent::Status { usb_powered: false } => {
                    self.handler.handle(&event);
                    log::warn!("usb power lost while sending on endpoint {expected:#04x}");
                    return Err(TransportError::Reset);
                }
                LinkEvent::BusReset => {
                    log::warn!("usb reset while sending on endpoint {expected:#04x}");
                    return Err(TransportError::Reset);
                }
                other => self.handler.handle(&other),
            }
        }
    }
}

impl<L: HidLink, H: EventHandler> ReportSink for EndpointWriter<'_, L, H> {
    fn send_report(&mut self, report: &KeyboardReport) -> Result<(), TransportError> {
        let mut bytes: [u8; HID_REPORT_SIZE] = report.to_bytes();
        let sent = self.send(&bytes);
        bytes.zeroize();
        sent
    }
}
