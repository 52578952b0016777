//! The errors a drive connector or connection can produce.
use thiserror::Error;

/// Failure reported by the remote drive or by the transport underneath it.
///
/// The variant matters more than the text: pollers retry [`Transient`](Error::Transient)
/// failures, while the other variants surface to the caller.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The drive rejected the presented credentials, code or token.
    #[error("Credentials rejected by the drive: {reason}")]
    CredentialsRejected { reason: String },

    /// The drive could not be reached or answered with something that could
    /// not be understood. Worth retrying.
    #[error("Transient drive failure: {reason}")]
    Transient { reason: String },

    /// The drive understood the request and refused it.
    #[error("Drive request failed: {reason}")]
    Failed { reason: String },
}

impl Error {
    /// Whether waiting and retrying the same request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }
}
