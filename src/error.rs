use crate::identity::DeviceIdentity;
use crate::report::ReportType;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while locating a HID device or exchanging reports with it.
///
/// `Format` and `BufferOverflow` are caller-input errors and never touch the
/// session. `Timeout` and `Io` always leave the session closed, so the next
/// call re-discovers the device.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// Error reported by a custom transport provider.
    #[error("Transport error: {0}")]
    Transport(String),
    /// A vendor/product ID or command token was not valid hexadecimal.
    #[error("Invalid format: {0}")]
    Format(String),
    /// No attached HID device matched the requested identity.
    #[error("Device {identity} not found ({candidates} candidates examined)")]
    NotFound {
        /// The identity that was searched for.
        identity: DeviceIdentity,
        /// Number of device paths that were examined.
        candidates: usize,
    },
    /// The payload does not fit in the report buffer after the report ID byte.
    #[error("Payload of {actual} bytes does not fit a {capacity}-byte report (max {} payload bytes)", capacity.saturating_sub(1))]
    BufferOverflow {
        /// Total report length, including the report ID byte.
        capacity: usize,
        /// Payload length that was supplied.
        actual: usize,
    },
    /// The session could not reach the read/write open state.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(#[source] Box<Error>),
    /// An interrupt transfer did not complete before its deadline.
    #[error("{report_type} report transfer timed out after {} ms", timeout.as_millis())]
    Timeout {
        /// The report type being transferred.
        report_type: ReportType,
        /// The deadline that elapsed.
        timeout: Duration,
    },
    /// Another transfer is already in flight on this session.
    #[error("A transfer is already in progress on this session")]
    Busy,
    /// The underlying transfer call reported failure.
    #[error("{report_type} report transfer failed: {message}")]
    Io {
        /// The report type being transferred.
        report_type: ReportType,
        /// Details from the transport.
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error (or the cause of a `DeviceUnavailable`) is `NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::DeviceUnavailable(inner) => inner.is_not_found(),
            _ => false,
        }
    }

    /// Returns `true` for errors caused by caller input rather than the device.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Format(_) | Error::BufferOverflow { .. })
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn io_failure(report_type: ReportType, err: impl std::fmt::Display) -> Error {
    Error::Io {
        report_type,
        message: err.to_string(),
    }
}
