//! Lists every HID interface the transport can see, with its VID/PID.
//!
//! Devices the current user may not open are reported and skipped.
//!
//! Run with: cargo run --example list_devices

use hid_report_session::{
    AccessMode, HidApiTransport, Transport, HID_CLASS_GUID,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("HID Device Enumeration");
    println!("======================\n");

    let transport = HidApiTransport::new()?;
    let paths = transport.enumerate_device_paths(HID_CLASS_GUID)?;
    if paths.is_empty() {
        println!("  No HID devices found.");
        return Ok(());
    }

    for (i, path) in paths.iter().enumerate() {
        let handle = match transport.open(path, AccessMode::ReadOnly) {
            Ok(h) => h,
            Err(e) => {
                println!("  [{}] {}: cannot open ({})", i, path, e);
                continue;
            }
        };
        match transport.attributes(&handle) {
            Ok(attrs) => println!(
                "  [{}] {:04X}:{:04X} v{:04X}  {}",
                i, attrs.vendor_id, attrs.product_id, attrs.version_number, path
            ),
            Err(e) => println!("  [{}] {}: attributes unavailable ({})", i, path, e),
        }
        transport.close(handle);
    }

    println!("\n{} device interface(s) found.", paths.len());
    Ok(())
}
