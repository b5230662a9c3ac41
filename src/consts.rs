//! Protocol constants and defaults.

/// Interface class GUID under which Windows exposes HID device interfaces.
/// Passed to [`crate::Transport::enumerate_device_paths`]; providers that only
/// ever enumerate HID devices (such as `hidapi`) may ignore it.
pub const HID_CLASS_GUID: &str = "4D1E55B2-F16F-11CF-88CB-001111000030";

/// Report ID written into byte 0 of every outgoing report buffer by default.
pub const DEFAULT_REPORT_ID: u8 = 0x00;

/// Deadline for interrupt transfers, in milliseconds.
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 5000;

/// Default upper bound on the number of device paths examined during discovery.
pub const DEFAULT_MAX_CANDIDATES: usize = 128;

// hidapi transport tuning
pub(crate) mod polling {
    /// Slice length for polling interrupt reads so a pending read can be cancelled.
    pub const READ_POLL_SLICE_MS: u64 = 50;
    /// Upper bound on reports drained by `flush_input`.
    pub const FLUSH_MAX_REPORTS: usize = 64;
    /// Scratch buffer size for reads while flushing.
    pub const FLUSH_BUF_SIZE: usize = 1024;
    /// Maximum size of a HID report descriptor.
    pub const MAX_REPORT_DESCRIPTOR_SIZE: usize = 4096;
}
