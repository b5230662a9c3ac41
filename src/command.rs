//! Payload bytes built up from user-entered hex tokens.

use crate::error::{Error, Result};
use crate::report::ReportBuffer;
use std::fmt;

/// One unit of user input appended to a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandToken<'a> {
    /// Hexadecimal text such as `"0A"` or `"ff"`.
    Hex(&'a str),
    /// A byte value used as is.
    Byte(u8),
}

/// An ordered, optionally named sequence of payload bytes.
/// The report ID is never part of a command; it is prepended by [`Command::serialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Command {
            name: Some(name.into()),
            bytes: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Command {
            name: None,
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Appends one token. On error the command is unchanged.
    pub fn append(&mut self, token: CommandToken<'_>) -> Result<()> {
        match token {
            CommandToken::Hex(s) => self.append_hex(s),
            CommandToken::Byte(b) => self.append_byte(b),
        }
    }

    /// Appends a hex token (`[0-9a-fA-F]+`) whose value fits in one byte.
    pub fn append_hex(&mut self, token: &str) -> Result<()> {
        let byte = parse_hex_byte(token)?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Appends a numerically entered byte.
    ///
    /// The value's decimal digits are read back as hex, so `10` appends `0x10`.
    /// Fails with `Format` if that text is not a one-byte hex value (`200`);
    /// the command is then unchanged. Use [`Command::from_bytes`] for raw bytes.
    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        let byte = parse_hex_byte(&byte.to_string())?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Appends every hex token of a whitespace or comma separated line.
    /// Either all tokens are appended or none are.
    pub fn append_line(&mut self, line: &str) -> Result<usize> {
        let parsed = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(parse_hex_byte)
            .collect::<Result<Vec<u8>>>()?;
        let count = parsed.len();
        self.bytes.extend(parsed);
        Ok(count)
    }

    /// Lays the command out as a `capacity`-byte report: `report_id`, then the bytes.
    /// Fails with `BufferOverflow` if the bytes need more than `capacity - 1`.
    pub fn serialize(&self, capacity: usize, report_id: u8) -> Result<ReportBuffer> {
        ReportBuffer::with_payload(capacity, report_id, &self.bytes)
    }
}

fn parse_hex_byte(token: &str) -> Result<u8> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Format(format!("'{}' is not a valid hex string", token)));
    }
    u8::from_str_radix(token, 16)
        .map_err(|_| Error::Format(format!("'{}' does not fit in one byte (00-FF)", token)))
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command Name: {}", self.name.as_deref().unwrap_or("<unnamed>"))?;
        for (i, byte) in self.bytes.iter().enumerate() {
            writeln!(f, "\t{}). 0x{:02X}", i + 1, byte)?;
        }
        Ok(())
    }
}
