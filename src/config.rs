//! Session configuration.

use crate::consts;
use crate::report::TransferMode;
use std::time::Duration;

/// Tunables for a [`crate::HidSession`].
///
/// ```
/// use hid_report_session::{SessionConfig, TransferMode};
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_transfer_mode(TransferMode::Control)
///     .with_transfer_timeout(Duration::from_millis(250));
/// assert_eq!(config.report_id, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pipe used for Output and Input reports.
    pub transfer_mode: TransferMode,
    /// Deadline for interrupt transfers.
    pub transfer_timeout: Duration,
    /// Upper bound on device paths examined per discovery.
    pub max_candidates: usize,
    /// Report ID written into byte 0 of every report buffer.
    pub report_id: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            transfer_mode: TransferMode::default(),
            transfer_timeout: Duration::from_millis(consts::DEFAULT_TRANSFER_TIMEOUT_MS),
            max_candidates: consts::DEFAULT_MAX_CANDIDATES,
            report_id: consts::DEFAULT_REPORT_ID,
        }
    }
}

impl SessionConfig {
    /// Sets the pipe used for Output and Input reports.
    pub fn with_transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer_mode = mode;
        self
    }

    /// Sets the deadline for interrupt transfers.
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Sets how many device paths one discovery may examine.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Sets the report ID written into byte 0 of outgoing and incoming buffers.
    pub fn with_report_id(mut self, report_id: u8) -> Self {
        self.report_id = report_id;
        self
    }
}
