//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use hid_report_session::{
    AccessMode, Capabilities, DeviceAttributes, DevicePath, Error, LocatedDevice, PendingTransfer,
    Result, Transport,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const TARGET_VID: u16 = 0x1B1C;
pub const TARGET_PID: u16 = 0x1B2E;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device the fake transport exposes.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub path: String,
    pub attributes: DeviceAttributes,
    pub capabilities: Capabilities,
    pub openable: bool,
    pub attributes_fail: bool,
}

impl FakeDevice {
    pub fn new(path: &str, vid: u16, pid: u16) -> Self {
        FakeDevice {
            path: path.to_string(),
            attributes: DeviceAttributes {
                vendor_id: vid,
                product_id: pid,
                version_number: 0x0100,
            },
            capabilities: Capabilities {
                input_report_length: 9,
                output_report_length: 9,
                feature_report_length: 9,
            },
            openable: true,
            attributes_fail: false,
        }
    }

    pub fn target(path: &str) -> Self {
        Self::new(path, TARGET_VID, TARGET_PID)
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }

    pub fn broken_attributes(mut self) -> Self {
        self.attributes_fail = true;
        self
    }
}

/// How an interrupt transfer behaves once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Completes immediately.
    Complete,
    /// Completes immediately with zero bytes.
    Empty,
    /// Never completes; `wait` sleeps out the whole deadline.
    Hang,
    /// Completes when the test releases the gate.
    Gated,
    /// `wait` reports an I/O error.
    Fail,
}

/// Every call the session made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Enumerate,
    Open(String, AccessMode),
    Close(String),
    Attributes(String),
    Capabilities(String),
    Flush(String),
    SendFeature(Vec<u8>),
    GetFeature,
    SendOutputControl(Vec<u8>),
    GetInputControl,
    BeginOutput(Vec<u8>),
    BeginInput,
    Cancel,
}

#[derive(Debug)]
pub struct FakeHandle {
    id: u64,
    device: usize,
    access: AccessMode,
}

#[derive(Default)]
struct State {
    next_id: u64,
    open: HashSet<u64>,
    calls: Vec<Call>,
    input_reports: VecDeque<Vec<u8>>,
    fail_control: bool,
}

struct Inner {
    devices: Mutex<Vec<FakeDevice>>,
    state: Mutex<State>,
    interrupt: Mutex<Interrupt>,
    gate: Mutex<Option<Receiver<()>>>,
}

/// Cloning yields a probe onto the same fake bus, so a test can keep
/// observing after handing the transport to a session.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        FakeTransport {
            inner: Arc::new(Inner {
                devices: Mutex::new(devices),
                state: Mutex::new(State::default()),
                interrupt: Mutex::new(Interrupt::Complete),
                gate: Mutex::new(None),
            }),
        }
    }

    pub fn set_interrupt(&self, behavior: Interrupt) {
        *self.inner.interrupt.lock() = behavior;
    }

    /// Arms the gate for `Interrupt::Gated`; sending on the returned sender releases it.
    pub fn arm_gate(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.inner.gate.lock() = Some(rx);
        self.set_interrupt(Interrupt::Gated);
        tx
    }

    pub fn set_fail_control(&self, fail: bool) {
        self.inner.state.lock().fail_control = fail;
    }

    pub fn queue_input(&self, report: Vec<u8>) {
        self.inner.state.lock().input_reports.push_back(report);
    }

    pub fn unplug_all(&self) {
        self.inner.devices.lock().clear();
    }

    pub fn plug(&self, device: FakeDevice) {
        self.inner.devices.lock().push(device);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.state.lock().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.inner.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn open_handles(&self) -> usize {
        self.inner.state.lock().open.len()
    }

    /// True if any report was handed to the device.
    pub fn device_contacted(&self) -> bool {
        self.count(|c| {
            matches!(
                c,
                Call::SendFeature(_)
                    | Call::GetFeature
                    | Call::SendOutputControl(_)
                    | Call::GetInputControl
                    | Call::BeginOutput(_)
                    | Call::BeginInput
            )
        }) > 0
    }

    pub fn close_located(&self, located: LocatedDevice<FakeHandle>) {
        Transport::close(self, located.handle);
    }

    fn record(&self, call: Call) {
        self.inner.state.lock().calls.push(call);
    }

    fn device(&self, handle: &FakeHandle) -> Result<FakeDevice> {
        self.inner.devices
            .lock()
            .get(handle.device)
            .cloned()
            .ok_or_else(|| Error::Transport("device unplugged".into()))
    }

    fn check_live(&self, handle: &FakeHandle) -> Result<()> {
        if !self.inner.state.lock().open.contains(&handle.id) {
            return Err(Error::Transport(format!("handle {} is closed", handle.id)));
        }
        if handle.access != AccessMode::ReadWrite {
            return Err(Error::Transport("handle is read-only".into()));
        }
        Ok(())
    }

    fn control_result(&self) -> Result<()> {
        if self.inner.state.lock().fail_control {
            Err(Error::Transport("control transfer stalled".into()))
        } else {
            Ok(())
        }
    }

    fn next_input(&self, buf: &mut [u8]) -> usize {
        match self.inner.state.lock().input_reports.pop_front() {
            Some(report) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                n
            }
            None => buf.len(),
        }
    }

    fn wait_interrupt(&self, timeout: Duration) -> Result<bool> {
        let behavior = *self.inner.interrupt.lock();
        match behavior {
            Interrupt::Complete | Interrupt::Empty => Ok(true),
            Interrupt::Hang => {
                thread::sleep(timeout);
                Ok(false)
            }
            Interrupt::Gated => {
                let rx = self.inner.gate.lock().take();
                match rx {
                    Some(rx) => Ok(rx.recv_timeout(timeout).is_ok()),
                    None => Ok(true),
                }
            }
            Interrupt::Fail => Err(Error::Transport("pipe error".into())),
        }
    }
}

impl Transport for FakeTransport {
    type Handle = FakeHandle;
    type PendingWrite<'a> = FakeWrite<'a>;
    type PendingRead<'a> = FakeRead<'a>;

    fn enumerate_device_paths(&self, _class_guid: &str) -> Result<Vec<DevicePath>> {
        self.record(Call::Enumerate);
        Ok(self
            .inner
            .devices
            .lock()
            .iter()
            .map(|d| DevicePath::new(d.path.clone()))
            .collect())
    }

    fn open(&self, path: &DevicePath, access: AccessMode) -> Result<FakeHandle> {
        self.record(Call::Open(path.to_string(), access));
        let devices = self.inner.devices.lock();
        let index = devices
            .iter()
            .position(|d| d.path == path.as_str())
            .ok_or_else(|| Error::Transport(format!("no device at {}", path)))?;
        if !devices[index].openable {
            return Err(Error::Transport("access denied".into()));
        }
        drop(devices);
        let mut state = self.inner.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.open.insert(id);
        Ok(FakeHandle {
            id,
            device: index,
            access,
        })
    }

    fn attributes(&self, handle: &FakeHandle) -> Result<DeviceAttributes> {
        let device = self.device(handle)?;
        self.record(Call::Attributes(device.path.clone()));
        if device.attributes_fail {
            return Err(Error::Transport("HidD_GetAttributes failed".into()));
        }
        Ok(device.attributes)
    }

    fn capabilities(&self, handle: &FakeHandle) -> Result<Capabilities> {
        let device = self.device(handle)?;
        self.record(Call::Capabilities(device.path.clone()));
        Ok(device.capabilities)
    }

    fn send_feature_report(&self, handle: &FakeHandle, report: &[u8]) -> Result<()> {
        self.check_live(handle)?;
        self.record(Call::SendFeature(report.to_vec()));
        self.control_result()
    }

    fn get_feature_report(&self, handle: &FakeHandle, buf: &mut [u8]) -> Result<usize> {
        self.check_live(handle)?;
        self.record(Call::GetFeature);
        self.control_result()?;
        Ok(self.next_input(buf))
    }

    fn send_output_report(&self, handle: &FakeHandle, report: &[u8]) -> Result<()> {
        self.check_live(handle)?;
        self.record(Call::SendOutputControl(report.to_vec()));
        self.control_result()
    }

    fn get_input_report(&self, handle: &FakeHandle, buf: &mut [u8]) -> Result<usize> {
        self.check_live(handle)?;
        self.record(Call::GetInputControl);
        self.control_result()?;
        Ok(self.next_input(buf))
    }

    fn begin_output_report<'a>(
        &'a self,
        handle: &'a FakeHandle,
        report: &'a [u8],
    ) -> Result<FakeWrite<'a>> {
        self.check_live(handle)?;
        self.record(Call::BeginOutput(report.to_vec()));
        Ok(FakeWrite {
            transport: self,
            len: report.len(),
        })
    }

    fn begin_input_report<'a>(
        &'a self,
        handle: &'a FakeHandle,
        buf: &'a mut [u8],
    ) -> Result<FakeRead<'a>> {
        self.check_live(handle)?;
        self.record(Call::BeginInput);
        Ok(FakeRead {
            transport: self,
            buf,
        })
    }

    fn flush_input(&self, handle: &FakeHandle) -> Result<()> {
        let device = self.device(handle)?;
        self.record(Call::Flush(device.path));
        Ok(())
    }

    fn close(&self, handle: FakeHandle) {
        let path = self
            .inner
            .devices
            .lock()
            .get(handle.device)
            .map(|d| d.path.clone())
            .unwrap_or_default();
        self.record(Call::Close(path));
        self.inner.state.lock().open.remove(&handle.id);
    }
}

pub struct FakeWrite<'a> {
    transport: &'a FakeTransport,
    len: usize,
}

impl PendingTransfer for FakeWrite<'_> {
    type Output = usize;

    fn wait(&mut self, timeout: Duration) -> Result<Option<usize>> {
        let empty = *self.transport.inner.interrupt.lock() == Interrupt::Empty;
        if !self.transport.wait_interrupt(timeout)? {
            return Ok(None);
        }
        Ok(Some(if empty { 0 } else { self.len }))
    }

    fn cancel(&mut self) {
        self.transport.record(Call::Cancel);
    }
}

pub struct FakeRead<'a> {
    transport: &'a FakeTransport,
    buf: &'a mut [u8],
}

impl PendingTransfer for FakeRead<'_> {
    type Output = usize;

    fn wait(&mut self, timeout: Duration) -> Result<Option<usize>> {
        let empty = *self.transport.inner.interrupt.lock() == Interrupt::Empty;
        if !self.transport.wait_interrupt(timeout)? {
            return Ok(None);
        }
        if empty {
            return Ok(Some(0));
        }
        Ok(Some(self.transport.next_input(self.buf)))
    }

    fn cancel(&mut self) {
        self.transport.record(Call::Cancel);
    }
}

/// `count` non-matching devices followed by the target.
pub fn devices_with_target_last(count: usize) -> Vec<FakeDevice> {
    let mut devices: Vec<FakeDevice> = (0..count)
        .map(|i| FakeDevice::new(&format!("/dev/hidraw{}", i), 0x046D, 0xC000 + i as u16))
        .collect();
    devices.push(FakeDevice::target(&format!("/dev/hidraw{}", count)));
    devices
}
