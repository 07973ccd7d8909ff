// MIT License - Copyright (c) 2026 Peter Wright
// Adapter-boundary error types

/// Outcome of a coordinator refresh that did not succeed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpdateError {
    /// Credentials rejected mid-operation. Routes to re-authentication and
    /// is never silently retried.
    #[error("authentication failed, re-authentication required")]
    AuthFailed,

    /// Transient failure; eligible for the next scheduled poll.
    #[error("update failed: {0}")]
    Failed(String),
}

/// A user-visible command failure raised at the adapter boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommandError {
    /// The caller-supplied code does not match the stored usercode. Raised
    /// locally, before any network call.
    #[error("entered code does not match the configured usercode")]
    InvalidPin,

    /// The stored usercode was rejected by the remote service; the account
    /// needs re-authentication.
    #[error("usercode rejected by the monitoring service")]
    UsercodeRejected,

    /// The remote service refused the command for another reason.
    #[error("command failed on {device}: {reason}")]
    Failed { device: String, reason: String },
}
