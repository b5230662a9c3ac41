//! Vendor/product identity of the target device.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// USB vendor/product pair identifying the device to locate.
/// Use `DeviceIdentity::parse(vid, pid)` for user-supplied hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    vendor_id: u16,
    product_id: u16,
}

impl DeviceIdentity {
    /// Creates an identity from already-validated IDs.
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        DeviceIdentity {
            vendor_id,
            product_id,
        }
    }

    /// Parses vendor and product IDs given as 1-4 hex digits (optional `0x` prefix).
    pub fn parse(vendor_id: &str, product_id: &str) -> Result<Self> {
        Ok(DeviceIdentity {
            vendor_id: parse_hex_id(vendor_id, "vendor")?,
            product_id: parse_hex_id(product_id, "product")?,
        })
    }

    #[inline]
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    #[inline]
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

fn parse_hex_id(input: &str, what: &str) -> Result<u16> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Format(format!(
            "{} ID '{}' must be 1-4 hexadecimal digits",
            what, input
        )));
    }
    // Cannot fail: at most 4 validated hex digits.
    u16::from_str_radix(digits, 16)
        .map_err(|e| Error::Format(format!("{} ID '{}': {}", what, input, e)))
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)
    }
}

/// Parses `"VVVV:PPPP"`.
impl FromStr for DeviceIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (vid, pid) = s.split_once(':').ok_or_else(|| {
            Error::Format(format!("identity '{}' must look like VVVV:PPPP", s))
        })?;
        DeviceIdentity::parse(vid, pid)
    }
}

/// Attributes a transport reports for an opened handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAttributes {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Device release number (bcdDevice).
    pub version_number: u16,
}

impl DeviceAttributes {
    /// Exact vendor and product comparison; the version number is ignored.
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        self.vendor_id == identity.vendor_id && self.product_id == identity.product_id
    }
}
