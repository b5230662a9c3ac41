//! # hid-report-session
//!
//! A Rust crate for locating a USB HID device by vendor/product ID and
//! exchanging Feature, Output and Input reports with it, with bounded
//! timeouts and automatic session recovery.
//!
//! This crate uses the `hidapi` crate for cross-platform USB HID communication,
//! behind a small [`Transport`] trait so the session logic can also run
//! against other providers (or an in-memory fake in tests).
//!
//! ## Features
//!
//! *   Device discovery by VID/PID (`DeviceLocator`), scanning at most
//!     `max_candidates` device paths and closing every non-matching handle.
//! *   A session handle (`HidSession`) that:
//!     *   Opens the matched device read-only, then reopens it read/write.
//!     *   Reads the device's Input/Output/Feature report lengths.
//!     *   Re-discovers the device transparently after any failure or timeout.
//!     *   Rejects overlapping transfers with `Error::Busy`.
//! *   Report I/O:
//!     *   Feature reports over the control pipe (`send_report`, `get_report`).
//!     *   Output/Input reports over the control or interrupt pipe (`TransferMode`).
//!     *   Interrupt transfers bounded by a deadline (5000 ms by default).
//!     *   Report types the device lacks yield `ReportOutcome::Unsupported`.
//! *   Payload building from hex tokens (`Command`) and a named command store
//!     (`CommandLibrary`).
//!
//! ## Report Layout
//!
//! Every report buffer is exactly as long as the device declares for its type.
//! Byte 0 is the report ID (`0x00` unless configured otherwise), and the
//! command bytes follow from byte 1. Callers never supply the report ID.
//! A command longer than the report length minus one fails with
//! `Error::BufferOverflow` before any I/O.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use hid_report_session::{
//!     Command, DeviceIdentity, HidApiTransport, HidSession, IncomingReport,
//!     OutgoingReport, ReportOutcome, Result,
//! };
//!
//! fn main() -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let identity = DeviceIdentity::parse("1b1c", "1b2e")?;
//!     let session = HidSession::new(HidApiTransport::new()?, identity);
//!
//!     if !session.locate_and_open(identity) {
//!         eprintln!("Device {} not found", identity);
//!         return Ok(());
//!     }
//!     println!("Capabilities: {:?}", session.capabilities());
//!
//!     let mut command = Command::new();
//!     command.append_line("07 FF 00 00")?;
//!     match session.send_report(OutgoingReport::Output, &command)? {
//!         ReportOutcome::Completed(()) => println!("Output report sent"),
//!         ReportOutcome::Unsupported(kind) => println!("Device has no {} report", kind),
//!     }
//!
//!     if let ReportOutcome::Completed(report) = session.get_report(IncomingReport::Input)? {
//!         println!("Input report: {:02X?}", report.payload());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Hardware Setup Notes
//!
//! *   **Linux udev Rules:** Grant user permission to the hidraw node. Create
//!     `/etc/udev/rules.d/99-hid-report-session.rules`:
//!     ```udev
//!     SUBSYSTEM=="hidraw", ATTRS{idVendor}=="1b1c", ATTRS{idProduct}=="1b2e", MODE="0666", GROUP="plugdev"
//!     ```
//!     Reload: `sudo udevadm control --reload-rules && sudo udevadm trigger`
//! *   **Keyboards and mice:** Most operating systems hold these devices
//!     exclusively. They can be discovered but report I/O will fail.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

pub mod command;
mod config;
mod consts;
pub mod descriptor;
mod error;
mod exchange;
pub mod identity;
mod library;
pub mod locator;
pub mod report;
mod session;
pub mod transport;

pub use command::{Command, CommandToken};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use exchange::HidSession;
pub use identity::{DeviceAttributes, DeviceIdentity};
pub use library::CommandLibrary;
pub use locator::{DeviceLocator, LocatedDevice};
pub use report::{
    Capabilities, IncomingReport, OutgoingReport, ReportBuffer, ReportOutcome, ReportType,
    TransferMode,
};
pub use session::{DeviceInfo, SessionState};
pub use transport::hidapi::{HidApiHandle, HidApiTransport};
pub use transport::{AccessMode, DevicePath, PendingTransfer, Transport};
// Re-export only the public defaults
pub use consts::{DEFAULT_MAX_CANDIDATES, DEFAULT_REPORT_ID, DEFAULT_TRANSFER_TIMEOUT_MS, HID_CLASS_GUID};
