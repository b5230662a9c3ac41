//! Device discovery: find the first HID whose attributes match an identity.

use crate::consts;
use crate::error::{Error, Result};
use crate::identity::{DeviceAttributes, DeviceIdentity};
use crate::transport::{AccessMode, DevicePath, Transport};
use log::{debug, trace, warn};

/// A device the locator matched, still open read-only.
#[derive(Debug)]
pub struct LocatedDevice<H> {
    pub path: DevicePath,
    pub attributes: DeviceAttributes,
    pub handle: H,
}

/// Scans the transport's HID device paths for an identity.
#[derive(Debug)]
pub struct DeviceLocator<'t, T: Transport> {
    transport: &'t T,
    max_candidates: usize,
}

impl<'t, T: Transport> DeviceLocator<'t, T> {
    pub fn new(transport: &'t T, max_candidates: usize) -> Self {
        DeviceLocator {
            transport,
            max_candidates,
        }
    }

    /// Opens each candidate read-only and returns the first exact VID/PID match.
    ///
    /// Every other handle opened during the scan is closed before moving on, so
    /// on `Err` no handle is left open.
    pub fn locate(&self, identity: &DeviceIdentity) -> Result<LocatedDevice<T::Handle>> {
        let mut paths = self.transport.enumerate_device_paths(consts::HID_CLASS_GUID)?;
        if paths.len() > self.max_candidates {
            warn!(
                "{} HID devices present, examining only the first {} (raise max_candidates to scan all)",
                paths.len(),
                self.max_candidates
            );
            paths.truncate(self.max_candidates);
        }
        debug!("Looking for {} among {} HID devices", identity, paths.len());

        let candidates = paths.len();
        for path in paths {
            let handle = match self.transport.open(&path, AccessMode::ReadOnly) {
                Ok(h) => h,
                Err(e) => {
                    debug!("Skipping {}: open failed: {}", path, e);
                    continue;
                }
            };
            match self.transport.attributes(&handle) {
                Ok(attributes) if attributes.matches(identity) => {
                    debug!(
                        "Matched {} at {} (version {:04X})",
                        identity, path, attributes.version_number
                    );
                    return Ok(LocatedDevice {
                        path,
                        attributes,
                        handle,
                    });
                }
                Ok(attributes) => {
                    trace!(
                        "{} is {:04X}:{:04X}, not a match",
                        path,
                        attributes.vendor_id,
                        attributes.product_id
                    );
                    self.transport.close(handle);
                }
                Err(e) => {
                    debug!("Skipping {}: attributes unavailable: {}", path, e);
                    self.transport.close(handle);
                }
            }
        }

        Err(Error::NotFound {
            identity: *identity,
            candidates,
        })
    }
}
