//! Drive capacity services.
//!
//! There is one service:
//!
//! - [`space_report`]: it returns how much of the drive's storage is used and
//!   how much is left.
//!
//! Transfers are rejected up front when the drive has no room for them; see
//! [`submit_checked`](crate::core::services::transfer::submit_checked).
use crate::core::drive::{self, Drive};

/// A snapshot of the drive's storage consumption, in bytes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SpaceReport {
    pub used: u64,
    pub capacity: u64,
}

impl SpaceReport {
    /// Bytes still free on the drive.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }

    /// Whether a download of the given size fits in the free space.
    #[must_use]
    pub fn can_fit(&self, required_bytes: u64) -> bool {
        required_bytes <= self.available()
    }
}

/// It returns the current [`SpaceReport`] for the drive behind the session.
///
/// # Errors
///
/// Will return a `drive::Error` if the usage query fails.
pub async fn space_report(drive: &dyn Drive) -> Result<SpaceReport, drive::Error> {
    let usage = drive.usage().await?;

    Ok(SpaceReport {
        used: usage.space_used,
        capacity: usage.space_max,
    })
}
