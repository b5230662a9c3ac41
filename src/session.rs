//! Session lifecycle: owns the device handle and moves it between states.

use crate::error::{Error, Result};
use crate::identity::{DeviceAttributes, DeviceIdentity};
use crate::locator::{DeviceLocator, LocatedDevice};
use crate::report::Capabilities;
use crate::transport::{AccessMode, DevicePath, Transport};
use log::{debug, warn};
use std::mem;

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing attempted yet.
    Uninitialized,
    /// Device paths are being scanned.
    Discovering,
    /// A match was found and is held with read-only access.
    ReadOnlyOpen,
    /// Ready for report I/O.
    ReadWriteOpen,
    /// Closed after an error, a timeout or an explicit close.
    Closed,
}

impl SessionState {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Uninitialized,
            1 => SessionState::Discovering,
            2 => SessionState::ReadOnlyOpen,
            3 => SessionState::ReadWriteOpen,
            _ => SessionState::Closed,
        }
    }
}

/// Where the open device lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: DevicePath,
    pub attributes: DeviceAttributes,
}

// The handle exists only in the two open variants.
#[derive(Debug)]
enum Link<H> {
    Uninitialized,
    Discovering,
    ReadOnlyOpen {
        handle: H,
        info: DeviceInfo,
    },
    ReadWriteOpen {
        handle: H,
        info: DeviceInfo,
        capabilities: Capabilities,
    },
    Closed,
}

/// Owner of the single device handle of a [`crate::HidSession`].
#[derive(Debug)]
pub(crate) struct Session<H> {
    identity: DeviceIdentity,
    link: Link<H>,
}

impl<H> Session<H> {
    pub(crate) fn new(identity: DeviceIdentity) -> Self {
        Session {
            identity,
            link: Link::Uninitialized,
        }
    }

    pub(crate) fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Retargets the session. The caller closes the current handle first.
    pub(crate) fn set_identity(&mut self, identity: DeviceIdentity) {
        self.identity = identity;
    }

    pub(crate) fn state(&self) -> SessionState {
        match self.link {
            Link::Uninitialized => SessionState::Uninitialized,
            Link::Discovering => SessionState::Discovering,
            Link::ReadOnlyOpen { .. } => SessionState::ReadOnlyOpen,
            Link::ReadWriteOpen { .. } => SessionState::ReadWriteOpen,
            Link::Closed => SessionState::Closed,
        }
    }

    pub(crate) fn capabilities(&self) -> Option<Capabilities> {
        match &self.link {
            Link::ReadWriteOpen { capabilities, .. } => Some(*capabilities),
            _ => None,
        }
    }

    pub(crate) fn device_info(&self) -> Option<&DeviceInfo> {
        match &self.link {
            Link::ReadOnlyOpen { info, .. } | Link::ReadWriteOpen { info, .. } => Some(info),
            _ => None,
        }
    }

    /// Brings the session to `ReadWriteOpen` and lends out the handle.
    ///
    /// Discovery runs only when no read/write handle is held. A locator miss
    /// returns `NotFound`; a failed reopen or capability query returns
    /// `DeviceUnavailable`. On any error the session ends `Closed` with no
    /// handle held.
    pub(crate) fn ensure_open<T>(
        &mut self,
        transport: &T,
        max_candidates: usize,
    ) -> Result<(&H, Capabilities)>
    where
        T: Transport<Handle = H>,
    {
        if !matches!(self.link, Link::ReadWriteOpen { .. }) {
            self.close(transport);
            self.link = Link::Discovering;
            match DeviceLocator::new(transport, max_candidates).locate(&self.identity) {
                Ok(located) => self.hold_read_only(located),
                Err(e) => {
                    self.link = Link::Closed;
                    return Err(e);
                }
            }
            self.promote(transport)?;
        }
        match &self.link {
            Link::ReadWriteOpen {
                handle,
                capabilities,
                ..
            } => Ok((handle, *capabilities)),
            _ => Err(Error::Transport("session did not reach read/write state".into())),
        }
    }

    fn hold_read_only(&mut self, located: LocatedDevice<H>) {
        self.link = Link::ReadOnlyOpen {
            handle: located.handle,
            info: DeviceInfo {
                path: located.path,
                attributes: located.attributes,
            },
        };
    }

    // ReadOnlyOpen -> close -> reopen read/write -> capabilities -> ReadWriteOpen
    fn promote<T>(&mut self, transport: &T) -> Result<()>
    where
        T: Transport<Handle = H>,
    {
        let Link::ReadOnlyOpen { handle, info } = mem::replace(&mut self.link, Link::Closed) else {
            return Err(Error::Transport("no read-only handle to promote".into()));
        };
        transport.close(handle);

        let handle = transport
            .open(&info.path, AccessMode::ReadWrite)
            .map_err(|e| Error::DeviceUnavailable(Box::new(e)))?;
        let capabilities = match transport.capabilities(&handle) {
            Ok(caps) => caps,
            Err(e) => {
                transport.close(handle);
                return Err(Error::DeviceUnavailable(Box::new(e)));
            }
        };
        if let Err(e) = transport.flush_input(&handle) {
            warn!("Could not flush pending input reports: {}", e);
        }

        debug!(
            "Session open on {} ({}): input={} output={} feature={}",
            info.path,
            self.identity,
            capabilities.input_report_length,
            capabilities.output_report_length,
            capabilities.feature_report_length
        );
        self.link = Link::ReadWriteOpen {
            handle,
            info,
            capabilities,
        };
        Ok(())
    }

    /// Releases the handle if one is held. Safe to call in any state.
    pub(crate) fn close<T>(&mut self, transport: &T)
    where
        T: Transport<Handle = H>,
    {
        match mem::replace(&mut self.link, Link::Closed) {
            Link::ReadOnlyOpen { handle, info } | Link::ReadWriteOpen { handle, info, .. } => {
                debug!("Closing session on {}", info.path);
                transport.close(handle);
            }
            Link::Uninitialized => self.link = Link::Uninitialized,
            Link::Discovering | Link::Closed => {}
        }
    }
}
