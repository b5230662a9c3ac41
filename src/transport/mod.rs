//! The native transport seam: everything the session needs from the OS.
//!
//! [`Transport`] covers device enumeration, handle creation, attribute and
//! capability queries, and the two report I/O disciplines. Control transfers
//! are plain blocking calls. Interrupt transfers start a [`PendingTransfer`]
//! that the session races against its deadline.
//!
//! [`hidapi::HidApiTransport`] is the production implementation.

pub mod hidapi;

use crate::error::Result;
use crate::identity::DeviceAttributes;
use crate::report::Capabilities;
use std::fmt;
use std::time::Duration;

/// Platform-specific path of a HID device interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DevicePath(String);

impl DevicePath {
    pub fn new(path: impl Into<String>) -> Self {
        DevicePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DevicePath {
    fn from(s: &str) -> Self {
        DevicePath(s.to_string())
    }
}

/// Access requested when opening a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Enough to read attributes of any HID, including system keyboards and mice.
    ReadOnly,
    /// Needed for report I/O.
    ReadWrite,
}

/// An interrupt transfer that has been started but not yet observed to finish.
pub trait PendingTransfer {
    type Output;

    /// Waits at most `timeout` for the transfer to finish.
    ///
    /// Returns `Ok(None)` if the deadline passed first; the caller is then
    /// expected to [`cancel`](PendingTransfer::cancel) the transfer.
    fn wait(&mut self, timeout: Duration) -> Result<Option<Self::Output>>;

    /// Abandons the transfer. A completion arriving later is discarded.
    fn cancel(&mut self);
}

/// Native transport provider consumed by the session.
///
/// Handles are owned values; [`Transport::close`] consumes one, so a handle
/// can never be closed twice or used after closing.
pub trait Transport {
    type Handle;
    /// Pending interrupt write, completing with the number of bytes written.
    type PendingWrite<'a>: PendingTransfer<Output = usize>
    where
        Self: 'a;
    /// Pending interrupt read, completing with the number of bytes placed in the buffer.
    type PendingRead<'a>: PendingTransfer<Output = usize>
    where
        Self: 'a;

    /// Lists the paths of all device interfaces of the given class.
    /// Order is not guaranteed to be stable between calls.
    fn enumerate_device_paths(&self, class_guid: &str) -> Result<Vec<DevicePath>>;

    fn open(&self, path: &DevicePath, access: AccessMode) -> Result<Self::Handle>;

    fn attributes(&self, handle: &Self::Handle) -> Result<DeviceAttributes>;

    fn capabilities(&self, handle: &Self::Handle) -> Result<Capabilities>;

    /// Control transfer. `report[0]` is the report ID.
    fn send_feature_report(&self, handle: &Self::Handle, report: &[u8]) -> Result<()>;

    /// Control transfer. `buf[0]` holds the report ID on entry.
    /// Returns the number of bytes read, report ID included.
    fn get_feature_report(&self, handle: &Self::Handle, buf: &mut [u8]) -> Result<usize>;

    /// Output report over the control pipe.
    fn send_output_report(&self, handle: &Self::Handle, report: &[u8]) -> Result<()>;

    /// Input report over the control pipe.
    fn get_input_report(&self, handle: &Self::Handle, buf: &mut [u8]) -> Result<usize>;

    /// Starts an output report write over the interrupt pipe.
    fn begin_output_report<'a>(
        &'a self,
        handle: &'a Self::Handle,
        report: &'a [u8],
    ) -> Result<Self::PendingWrite<'a>>;

    /// Starts an input report read over the interrupt pipe.
    fn begin_input_report<'a>(
        &'a self,
        handle: &'a Self::Handle,
        buf: &'a mut [u8],
    ) -> Result<Self::PendingRead<'a>>;

    /// Discards input reports queued before the session started.
    fn flush_input(&self, _handle: &Self::Handle) -> Result<()> {
        Ok(())
    }

    /// Releases a handle.
    fn close(&self, handle: Self::Handle) {
        drop(handle);
    }
}
