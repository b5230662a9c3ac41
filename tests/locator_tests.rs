// tests/locator_tests.rs
mod common;

use common::{devices_with_target_last, init_logging, Call, FakeDevice, FakeTransport};
use hid_report_session::{AccessMode, DeviceIdentity, DeviceLocator, Error};

const TARGET: DeviceIdentity = DeviceIdentity::new(common::TARGET_VID, common::TARGET_PID);

#[test]
fn test_match_among_many_closes_every_other_handle() {
    init_logging();
    let transport = FakeTransport::new(devices_with_target_last(5));
    let locator = DeviceLocator::new(&transport, 128);

    let located = locator.locate(&TARGET).expect("target should be found");
    assert_eq!(located.path.as_str(), "/dev/hidraw5");
    assert_eq!(located.attributes.vendor_id, common::TARGET_VID);
    assert_eq!(located.attributes.product_id, common::TARGET_PID);

    // Only the returned handle is still open.
    assert_eq!(transport.open_handles(), 1);
    assert_eq!(transport.count(|c| matches!(c, Call::Close(_))), 5);
    assert_eq!(
        transport.count(|c| matches!(c, Call::Open(_, AccessMode::ReadOnly))),
        6
    );
    assert_eq!(transport.count(|c| matches!(c, Call::Open(_, AccessMode::ReadWrite))), 0);

    transport.close_located(located);
    assert_eq!(transport.open_handles(), 0);
}

#[test]
fn test_not_found_leaves_no_handles_open() {
    init_logging();
    let devices = (0..4)
        .map(|i| FakeDevice::new(&format!("/dev/hidraw{}", i), 0x046D, 0xC52B))
        .collect();
    let transport = FakeTransport::new(devices);

    match DeviceLocator::new(&transport, 128).locate(&TARGET) {
        Err(Error::NotFound {
            identity,
            candidates,
        }) => {
            assert_eq!(identity, TARGET);
            assert_eq!(candidates, 4);
        }
        other => panic!("expected NotFound, got {:?}", other.map(|l| l.path)),
    }
    assert_eq!(transport.open_handles(), 0);
    assert_eq!(transport.count(|c| matches!(c, Call::Close(_))), 4);
}

#[test]
fn test_empty_bus_is_not_found() {
    let transport = FakeTransport::new(Vec::new());
    let err = DeviceLocator::new(&transport, 128)
        .locate(&TARGET)
        .map(|l| l.path)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(transport.count(|c| matches!(c, Call::Open(..))), 0);
}

#[test]
fn test_candidate_cap_limits_the_scan() {
    init_logging();
    // Target sits at index 10, beyond a cap of 4.
    let transport = FakeTransport::new(devices_with_target_last(10));

    let err = DeviceLocator::new(&transport, 4)
        .locate(&TARGET)
        .map(|l| l.path)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { candidates: 4, .. }));
    assert_eq!(transport.count(|c| matches!(c, Call::Open(..))), 4);
    assert_eq!(transport.open_handles(), 0);

    // Raising the cap finds it.
    let located = DeviceLocator::new(&transport, 11)
        .locate(&TARGET)
        .expect("target within cap");
    assert_eq!(located.path.as_str(), "/dev/hidraw10");
    transport.close_located(located);
}

#[test]
fn test_unopenable_and_unreadable_devices_are_skipped() {
    init_logging();
    let transport = FakeTransport::new(vec![
        FakeDevice::target("/dev/hidraw0").unopenable(),
        FakeDevice::target("/dev/hidraw1").broken_attributes(),
        FakeDevice::new("/dev/hidraw2", 0x1B1C, 0x0001),
        FakeDevice::target("/dev/hidraw3"),
    ]);

    let located = DeviceLocator::new(&transport, 128)
        .locate(&TARGET)
        .expect("healthy target should be found");
    assert_eq!(located.path.as_str(), "/dev/hidraw3");
    // hidraw1 and hidraw2 were opened and closed again; hidraw0 never opened.
    assert_eq!(transport.open_handles(), 1);
    assert_eq!(
        transport.calls().iter().filter(|c| matches!(c, Call::Close(_))).count(),
        2
    );
    transport.close_located(located);
}

#[test]
fn test_vid_and_pid_must_both_match() {
    let transport = FakeTransport::new(vec![
        FakeDevice::new("/dev/hidraw0", common::TARGET_VID, 0x0000),
        FakeDevice::new("/dev/hidraw1", 0x0000, common::TARGET_PID),
    ]);
    let err = DeviceLocator::new(&transport, 128)
        .locate(&TARGET)
        .map(|l| l.path)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_first_match_wins() {
    let transport = FakeTransport::new(vec![
        FakeDevice::target("/dev/hidraw0"),
        FakeDevice::target("/dev/hidraw1"),
    ]);
    let located = DeviceLocator::new(&transport, 128)
        .locate(&TARGET)
        .expect("target");
    assert_eq!(located.path.as_str(), "/dev/hidraw0");
    // The scan stopped at the first match.
    assert_eq!(transport.count(|c| matches!(c, Call::Open(..))), 1);
    transport.close_located(located);
}
