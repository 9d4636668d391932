pub const SERIAL_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;
/// Largest response payload the host accepts.
pub const HOST_BUFFER_SIZE: usize = 4 * 1024;
pub const DEVICE_USB_VID: u16 = 0x1209;
pub const DEVICE_USB_PID: u16 = 0x5057;
pub const DEVICE_IDENTITY_KEYWORDS: &[&str] = &["passkeeper", "labelpass"];
/// Upper bound on reads per listing pass, well above what the log can hold.
pub const MAX_LIST_READS: usize = 2048;
