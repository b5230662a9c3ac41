//! Report exchange: the public session handle and the send/get protocol.

use crate::command::Command;
use crate::config::SessionConfig;
use crate::error::{io_failure, Error, Result};
use crate::identity::DeviceIdentity;
use crate::report::{
    Capabilities, IncomingReport, OutgoingReport, ReportBuffer, ReportOutcome, ReportType,
    TransferMode,
};
use crate::session::{DeviceInfo, Session, SessionState};
use crate::transport::{PendingTransfer, Transport};
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Single-flight claim on the session; released on drop, whatever the exit path.
struct TransferGuard<'a>(&'a AtomicBool);

impl<'a> TransferGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| Error::Busy)?;
        Ok(TransferGuard(flag))
    }
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Locked session that publishes its state to `snapshot` when released.
struct Locked<'a, H> {
    guard: MutexGuard<'a, Session<H>>,
    snapshot: &'a AtomicU8,
}

impl<H> Deref for Locked<'_, H> {
    type Target = Session<H>;

    fn deref(&self) -> &Session<H> {
        &self.guard
    }
}

impl<H> DerefMut for Locked<'_, H> {
    fn deref_mut(&mut self) -> &mut Session<H> {
        &mut self.guard
    }
}

impl<H> Drop for Locked<'_, H> {
    fn drop(&mut self) {
        self.snapshot.store(self.guard.state().as_u8(), Ordering::Release);
    }
}

fn unavailable(e: Error) -> Error {
    match e {
        Error::DeviceUnavailable(_) => e,
        other => Error::DeviceUnavailable(Box::new(other)),
    }
}

/// A communication session with one HID device, identified by VID/PID.
///
/// The device is located lazily: every report operation first makes sure a
/// read/write handle is held, running discovery if it is not. Any transfer
/// failure or timeout closes the handle, so the next call starts over.
///
/// Only one transfer may be in flight at a time. A call that arrives while
/// another is running fails with [`Error::Busy`] instead of waiting. The
/// session is `Sync` whenever its transport is and can be shared via `Arc`.
///
/// A running transfer holds the session lock until it finishes, which for an
/// interrupt transfer can be the whole `transfer_timeout`. [`state`](Self::state)
/// and [`transfer_in_progress`](Self::transfer_in_progress) never wait for it;
/// [`identity`](Self::identity), [`capabilities`](Self::capabilities),
/// [`device_info`](Self::device_info) and [`close`](Self::close) do.
pub struct HidSession<T: Transport> {
    transport: T,
    config: SessionConfig,
    session: Mutex<Session<T::Handle>>,
    // Last settled state, published whenever the lock is released.
    state: AtomicU8,
    transfer_in_progress: AtomicBool,
}

impl<T: Transport> HidSession<T> {
    /// Creates a session in the `Uninitialized` state. No device I/O happens here.
    pub fn new(transport: T, identity: DeviceIdentity) -> Self {
        Self::with_config(transport, identity, SessionConfig::default())
    }

    /// Creates a session with explicit tunables. No device I/O happens here.
    pub fn with_config(transport: T, identity: DeviceIdentity, config: SessionConfig) -> Self {
        HidSession {
            transport,
            config,
            session: Mutex::new(Session::new(identity)),
            state: AtomicU8::new(SessionState::Uninitialized.as_u8()),
            transfer_in_progress: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> Locked<'_, T::Handle> {
        Locked {
            guard: self.session.lock(),
            snapshot: &self.state,
        }
    }

    // --- Lifecycle ---

    /// Retargets the session to `identity` and opens it.
    /// Returns `false` if the device could not be opened (or a transfer is in flight).
    pub fn locate_and_open(&self, identity: DeviceIdentity) -> bool {
        let _guard = match TransferGuard::acquire(&self.transfer_in_progress) {
            Ok(g) => g,
            Err(e) => {
                warn!("Cannot open {}: {}", identity, e);
                return false;
            }
        };
        let mut session = self.lock();
        session.close(&self.transport);
        session.set_identity(identity);
        match session.ensure_open(&self.transport, self.config.max_candidates) {
            Ok(_) => {
                info!("Handle obtained to device {}", identity);
                true
            }
            Err(e) => {
                info!("Device {} not opened: {}", identity, e);
                false
            }
        }
    }

    /// Opens the session if it is not already open for read/write.
    pub fn ensure_open(&self) -> Result<()> {
        let _guard = TransferGuard::acquire(&self.transfer_in_progress)?;
        let mut session = self.lock();
        session.ensure_open(&self.transport, self.config.max_candidates)?;
        Ok(())
    }

    /// Releases the device handle. Idempotent; the next report call re-discovers.
    pub fn close(&self) {
        self.lock().close(&self.transport);
    }

    // --- Queries ---

    /// Lifecycle state as of the last completed operation. Never blocks.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Identity the session targets.
    pub fn identity(&self) -> DeviceIdentity {
        self.session.lock().identity()
    }

    /// Report lengths of the open device, `None` unless `ReadWriteOpen`.
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.session.lock().capabilities()
    }

    /// Path and attributes of the open device, `None` unless open.
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.session.lock().device_info().cloned()
    }

    /// True while a report operation or discovery holds the session.
    pub fn transfer_in_progress(&self) -> bool {
        self.transfer_in_progress.load(Ordering::Acquire)
    }

    /// Tunables in effect.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Switches the pipe used for Output and Input reports.
    pub fn set_transfer_mode(&mut self, mode: TransferMode) {
        self.config.transfer_mode = mode;
    }

    /// The underlying transport provider.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // --- Report I/O ---

    /// Sends `command` as a Feature or Output report.
    ///
    /// The configured report ID is written into byte 0, followed by the command
    /// bytes, zero padded to the device's report length. Returns
    /// `ReportOutcome::Unsupported` without any I/O if the device has no
    /// report of that type.
    pub fn send_report(
        &self,
        report: OutgoingReport,
        command: &Command,
    ) -> Result<ReportOutcome<()>> {
        let report_type = ReportType::from(report);
        let _guard = TransferGuard::acquire(&self.transfer_in_progress)?;
        let mut session = self.lock();

        let result = {
            let (handle, capabilities) = session
                .ensure_open(&self.transport, self.config.max_candidates)
                .map_err(unavailable)?;
            let len = usize::from(capabilities.report_length(report_type));
            if len == 0 {
                debug!("Device has no {} report, nothing sent", report_type);
                return Ok(ReportOutcome::Unsupported(report_type));
            }
            let buffer = command.serialize(len, self.config.report_id)?;
            trace!("Sending {} report: {:02X?}", report_type, buffer.as_bytes());
            self.transmit(handle, report, &buffer)
        };

        match result {
            Ok(()) => Ok(ReportOutcome::Completed(())),
            Err(e) => {
                warn!("{}; closing session", e);
                session.close(&self.transport);
                Err(e)
            }
        }
    }

    /// Requests a Feature or Input report.
    ///
    /// The returned buffer starts with the report ID byte and is truncated to
    /// the number of bytes the device delivered.
    pub fn get_report(&self, report: IncomingReport) -> Result<ReportOutcome<ReportBuffer>> {
        let report_type = ReportType::from(report);
        let _guard = TransferGuard::acquire(&self.transfer_in_progress)?;
        let mut session = self.lock();

        let result = {
            let (handle, capabilities) = session
                .ensure_open(&self.transport, self.config.max_candidates)
                .map_err(unavailable)?;
            let len = usize::from(capabilities.report_length(report_type));
            if len == 0 {
                debug!("Device has no {} report, nothing read", report_type);
                return Ok(ReportOutcome::Unsupported(report_type));
            }
            let mut buffer = ReportBuffer::for_receive(len, self.config.report_id);
            match self.receive(handle, report, &mut buffer) {
                Ok(0) => Err(io_failure(report_type, "device returned no data")),
                Ok(read) => Ok(ReportBuffer::from_received(buffer.into_bytes(), read)),
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(buffer) => {
                trace!("Received {} report: {:02X?}", report_type, buffer.as_bytes());
                Ok(ReportOutcome::Completed(buffer))
            }
            Err(e) => {
                warn!("{}; closing session", e);
                session.close(&self.transport);
                Err(e)
            }
        }
    }

    fn transmit(
        &self,
        handle: &T::Handle,
        report: OutgoingReport,
        buffer: &ReportBuffer,
    ) -> Result<()> {
        let bytes = buffer.as_bytes();
        match (report, self.config.transfer_mode) {
            (OutgoingReport::Feature, _) => self
                .transport
                .send_feature_report(handle, bytes)
                .map_err(|e| io_failure(ReportType::Feature, e)),
            (OutgoingReport::Output, TransferMode::Control) => self
                .transport
                .send_output_report(handle, bytes)
                .map_err(|e| io_failure(ReportType::Output, e)),
            (OutgoingReport::Output, TransferMode::Interrupt) => {
                let mut pending = self
                    .transport
                    .begin_output_report(handle, bytes)
                    .map_err(|e| io_failure(ReportType::Output, e))?;
                match self.race(&mut pending, ReportType::Output)? {
                    0 => Err(io_failure(ReportType::Output, "no bytes written")),
                    _ => Ok(()),
                }
            }
        }
    }

    fn receive(
        &self,
        handle: &T::Handle,
        report: IncomingReport,
        buffer: &mut ReportBuffer,
    ) -> Result<usize> {
        let bytes = buffer.as_bytes_mut();
        match (report, self.config.transfer_mode) {
            (IncomingReport::Feature, _) => self
                .transport
                .get_feature_report(handle, bytes)
                .map_err(|e| io_failure(ReportType::Feature, e)),
            (IncomingReport::Input, TransferMode::Control) => self
                .transport
                .get_input_report(handle, bytes)
                .map_err(|e| io_failure(ReportType::Input, e)),
            (IncomingReport::Input, TransferMode::Interrupt) => {
                let mut pending = self
                    .transport
                    .begin_input_report(handle, bytes)
                    .map_err(|e| io_failure(ReportType::Input, e))?;
                self.race(&mut pending, ReportType::Input)
            }
        }
    }

    /// Waits for an interrupt transfer against the configured deadline.
    /// Whichever comes first decides the result; a late transfer is cancelled.
    fn race<P>(&self, pending: &mut P, report_type: ReportType) -> Result<usize>
    where
        P: PendingTransfer<Output = usize>,
    {
        let timeout = self.config.transfer_timeout;
        match pending.wait(timeout) {
            Ok(Some(count)) => Ok(count),
            Ok(None) => {
                pending.cancel();
                Err(Error::Timeout {
                    report_type,
                    timeout,
                })
            }
            Err(e) => {
                pending.cancel();
                Err(io_failure(report_type, e))
            }
        }
    }
}

impl<T: Transport> fmt::Debug for HidSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidSession")
            .field("config", &self.config)
            .field("transfer_in_progress", &self.transfer_in_progress())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Drop for HidSession<T> {
    fn drop(&mut self) {
        self.session.get_mut().close(&self.transport);
    }
}
