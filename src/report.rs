//! Report kinds, capability lengths and the report buffer layout.

use crate::error::{Error, Result};
use std::fmt;

/// The three HID report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    Feature,
    Output,
    Input,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportType::Feature => "Feature",
            ReportType::Output => "Output",
            ReportType::Input => "Input",
        };
        f.write_str(name)
    }
}

/// Reports the host can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingReport {
    Feature,
    Output,
}

/// Reports the host can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingReport {
    Feature,
    Input,
}

impl From<OutgoingReport> for ReportType {
    fn from(r: OutgoingReport) -> Self {
        match r {
            OutgoingReport::Feature => ReportType::Feature,
            OutgoingReport::Output => ReportType::Output,
        }
    }
}

impl From<IncomingReport> for ReportType {
    fn from(r: IncomingReport) -> Self {
        match r {
            IncomingReport::Feature => ReportType::Feature,
            IncomingReport::Input => ReportType::Input,
        }
    }
}

/// USB transfer type used for Output and Input reports.
/// Feature reports always go over the control pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    Control,
    #[default]
    Interrupt,
}

/// Report lengths declared by the device, each including the report ID byte.
/// A length of 0 means the device has no report of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub input_report_length: u16,
    pub output_report_length: u16,
    pub feature_report_length: u16,
}

impl Capabilities {
    pub fn report_length(&self, report_type: ReportType) -> u16 {
        match report_type {
            ReportType::Feature => self.feature_report_length,
            ReportType::Output => self.output_report_length,
            ReportType::Input => self.input_report_length,
        }
    }

    #[inline]
    pub fn supports(&self, report_type: ReportType) -> bool {
        self.report_length(report_type) > 0
    }
}

/// Result of a report operation that completed without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome<T> {
    /// The transfer went through.
    Completed(T),
    /// The device declares no report of this type; nothing was transferred.
    Unsupported(ReportType),
}

impl<T> ReportOutcome<T> {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ReportOutcome::Unsupported(_))
    }

    /// Returns the completed value, or `None` for `Unsupported`.
    pub fn completed(self) -> Option<T> {
        match self {
            ReportOutcome::Completed(v) => Some(v),
            ReportOutcome::Unsupported(_) => None,
        }
    }
}

/// A report as it travels on the wire: report ID in byte 0, payload from byte 1.
///
/// The buffer length is fixed at construction to the capability length of the
/// report type, so short payloads are zero padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBuffer {
    bytes: Vec<u8>,
}

impl ReportBuffer {
    /// Builds a `len`-byte buffer holding `report_id` followed by `payload`.
    /// Fails with `BufferOverflow` if `payload.len() > len - 1`.
    pub fn with_payload(len: usize, report_id: u8, payload: &[u8]) -> Result<Self> {
        if len == 0 || payload.len() > len - 1 {
            return Err(Error::BufferOverflow {
                capacity: len,
                actual: payload.len(),
            });
        }
        let mut bytes = vec![0u8; len];
        bytes[0] = report_id;
        bytes[1..1 + payload.len()].copy_from_slice(payload);
        Ok(ReportBuffer { bytes })
    }

    /// A zeroed receive buffer of `len` bytes with the report ID preset.
    /// `len` must be at least 1.
    pub(crate) fn for_receive(len: usize, report_id: u8) -> Self {
        let mut bytes = vec![0u8; len.max(1)];
        bytes[0] = report_id;
        ReportBuffer { bytes }
    }

    /// Wraps bytes read from a device; `bytes[0]` is taken as the report ID.
    pub(crate) fn from_received(mut bytes: Vec<u8>, received: usize) -> Self {
        bytes.truncate(received.max(1));
        ReportBuffer { bytes }
    }

    #[inline]
    pub fn report_id(&self) -> u8 {
        self.bytes[0]
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a buffer holds at least the report ID byte.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
