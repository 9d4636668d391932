//! Keyboard side of the device: layout tables, boot-protocol reports and the local action queue.

pub mod actions;
pub mod keymap;
pub mod report;


pub use keymap::{KeyStroke, KeyboardLayout, KeymapError, Keystrokes, map_char};
pub use report::{HID_REPORT_SIZE, KEYBOARD_ROLLOVER, KeyboardReport};
