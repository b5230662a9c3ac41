//! [`Transport`] implementation backed by the `hidapi` crate.

use super::{AccessMode, DevicePath, PendingTransfer, Transport};
use crate::consts;
use crate::descriptor::{self, ReportLayout};
use crate::error::{Error, Result};
use crate::identity::DeviceAttributes;
use crate::report::Capabilities;
use ::hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::ffi::CString;
use std::fmt;
use std::time::{Duration, Instant};

/// An opened hidapi device plus the report layout learned when it was opened read/write.
pub struct HidApiHandle {
    device: HidDevice,
    layout: Option<ReportLayout>,
}

impl HidApiHandle {
    /// Devices without numbered reports return Input reports without the ID byte.
    fn numbered_reports(&self) -> bool {
        self.layout.is_some_and(|l| l.numbered_reports)
    }
}

/// Native transport over `hidapi`.
///
/// `hidapi` opens every path with the same access, so both [`AccessMode`]s map
/// to `open_path`. Report lengths come from the report descriptor unless an
/// explicit override is configured with [`HidApiTransport::with_capabilities`].
pub struct HidApiTransport {
    api: Mutex<HidApi>,
    capabilities_override: Option<Capabilities>,
}

impl HidApiTransport {
    pub fn new() -> Result<Self> {
        Ok(Self::from_api(HidApi::new()?))
    }

    pub fn from_api(api: HidApi) -> Self {
        HidApiTransport {
            api: Mutex::new(api),
            capabilities_override: None,
        }
    }

    /// Uses fixed report lengths instead of walking the report descriptor.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities_override = Some(capabilities);
        self
    }

    fn read_layout(device: &HidDevice) -> Result<ReportLayout> {
        let mut buf = vec![0u8; consts::polling::MAX_REPORT_DESCRIPTOR_SIZE];
        let len = device.get_report_descriptor(&mut buf)?;
        trace!("Report descriptor ({} bytes): {:02X?}", len, &buf[..len]);
        Ok(descriptor::report_layout(&buf[..len]))
    }
}

impl fmt::Debug for HidApiTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidApiTransport")
            .field("capabilities_override", &self.capabilities_override)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for HidApiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidApiHandle")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Transport for HidApiTransport {
    type Handle = HidApiHandle;
    type PendingWrite<'a> = PendingWrite<'a>;
    type PendingRead<'a> = PendingRead<'a>;

    fn enumerate_device_paths(&self, _class_guid: &str) -> Result<Vec<DevicePath>> {
        let mut api = self.api.lock();
        api.refresh_devices()?;
        let paths: Vec<DevicePath> = api
            .device_list()
            .map(|info| DevicePath::new(info.path().to_string_lossy()))
            .collect();
        debug!("Enumerated {} HID device paths", paths.len());
        Ok(paths)
    }

    fn open(&self, path: &DevicePath, access: AccessMode) -> Result<HidApiHandle> {
        let c_path = CString::new(path.as_str())
            .map_err(|e| Error::Transport(format!("invalid device path {:?}: {}", path, e)))?;
        let device = self.api.lock().open_path(&c_path)?;
        let layout = match access {
            AccessMode::ReadOnly => None,
            AccessMode::ReadWrite if self.capabilities_override.is_some() => None,
            AccessMode::ReadWrite => match Self::read_layout(&device) {
                Ok(layout) => Some(layout),
                Err(e) => {
                    warn!("Could not read report descriptor for {}: {}", path, e);
                    None
                }
            },
        };
        trace!("Opened {} ({:?})", path, access);
        Ok(HidApiHandle { device, layout })
    }

    fn attributes(&self, handle: &HidApiHandle) -> Result<DeviceAttributes> {
        let info = handle.device.get_device_info()?;
        Ok(DeviceAttributes {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            version_number: info.release_number(),
        })
    }

    fn capabilities(&self, handle: &HidApiHandle) -> Result<Capabilities> {
        if let Some(caps) = self.capabilities_override {
            return Ok(caps);
        }
        handle
            .layout
            .map(|l| l.capabilities)
            .ok_or_else(|| Error::Transport("report descriptor unavailable".to_string()))
    }

    fn send_feature_report(&self, handle: &HidApiHandle, report: &[u8]) -> Result<()> {
        Ok(handle.device.send_feature_report(report)?)
    }

    fn get_feature_report(&self, handle: &HidApiHandle, buf: &mut [u8]) -> Result<usize> {
        Ok(handle.device.get_feature_report(buf)?)
    }

    fn send_output_report(&self, handle: &HidApiHandle, report: &[u8]) -> Result<()> {
        Ok(handle.device.send_output_report(report)?)
    }

    fn get_input_report(&self, handle: &HidApiHandle, buf: &mut [u8]) -> Result<usize> {
        Ok(handle.device.get_input_report(buf)?)
    }

    fn begin_output_report<'a>(
        &'a self,
        handle: &'a HidApiHandle,
        report: &'a [u8],
    ) -> Result<PendingWrite<'a>> {
        Ok(PendingWrite {
            device: &handle.device,
            report,
            cancelled: false,
        })
    }

    fn begin_input_report<'a>(
        &'a self,
        handle: &'a HidApiHandle,
        buf: &'a mut [u8],
    ) -> Result<PendingRead<'a>> {
        Ok(PendingRead {
            device: &handle.device,
            buf,
            numbered_reports: handle.numbered_reports(),
            cancelled: false,
        })
    }

    fn flush_input(&self, handle: &HidApiHandle) -> Result<()> {
        let mut scratch = [0u8; consts::polling::FLUSH_BUF_SIZE];
        let mut drained = 0;
        while drained < consts::polling::FLUSH_MAX_REPORTS
            && handle.device.read_timeout(&mut scratch, 0)? > 0
        {
            drained += 1;
        }
        if drained > 0 {
            debug!("Flushed {} queued input reports", drained);
        }
        Ok(())
    }
}

/// Interrupt write through `hid_write`.
///
/// `hid_write` blocks until the OS accepts the report and cannot be
/// interrupted, so the write is issued on the first `wait` and the deadline
/// does not bound it.
///
/// # Caveat
///
/// A write that returns after the deadline has already delivered its report
/// to the device, yet `wait` reports it as timed out (`Ok(None)`), so the
/// session closes and the caller sees `Error::Timeout`. Treat a timed-out
/// Output report as "possibly delivered" on this provider.
pub struct PendingWrite<'a> {
    device: &'a HidDevice,
    report: &'a [u8],
    cancelled: bool,
}

impl PendingTransfer for PendingWrite<'_> {
    type Output = usize;

    fn wait(&mut self, timeout: Duration) -> Result<Option<usize>> {
        if self.cancelled {
            return Ok(None);
        }
        let started = Instant::now();
        let written = self.device.write(self.report)?;
        if !within_deadline(started.elapsed(), timeout) {
            warn!("Interrupt write returned after the {:?} deadline", timeout);
            return Ok(None);
        }
        Ok(Some(written))
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

fn within_deadline(elapsed: Duration, timeout: Duration) -> bool {
    elapsed <= timeout
}

/// Interrupt read polled in short slices so it can stop at the deadline.
pub struct PendingRead<'a> {
    device: &'a HidDevice,
    buf: &'a mut [u8],
    numbered_reports: bool,
    cancelled: bool,
}

impl PendingTransfer for PendingRead<'_> {
    type Output = usize;

    fn wait(&mut self, timeout: Duration) -> Result<Option<usize>> {
        let deadline = Instant::now() + timeout;
        let slice = Duration::from_millis(consts::polling::READ_POLL_SLICE_MS);
        while !self.cancelled {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let wait_ms = remaining.min(slice).as_millis().max(1) as i32;
            let read = if self.numbered_reports {
                self.device.read_timeout(&mut self.buf[..], wait_ms)?
            } else {
                // hidapi strips the implicit report ID 0; keep byte 0 for it.
                let Some(payload) = self.buf.get_mut(1..) else {
                    return Err(Error::Transport("input buffer has no payload room".into()));
                };
                match self.device.read_timeout(payload, wait_ms)? {
                    0 => 0,
                    n => {
                        self.buf[0] = 0;
                        n + 1
                    }
                }
            };
            if read > 0 {
                return Ok(Some(read));
            }
        }
        Ok(None)
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_late_write_counts_as_timeout() {
        let timeout = Duration::from_millis(5000);
        assert!(within_deadline(Duration::from_millis(12), timeout));
        assert!(within_deadline(timeout, timeout));
        // Delivered, but after the deadline.
        assert!(!within_deadline(timeout + Duration::from_millis(1), timeout));
    }
}
