// MIT License - Copyright (c) 2026 Peter Wright
// Client failure taxonomy

/// Failures reported by the remote-service client.
///
/// The adapter layer never inspects anything finer-grained than these
/// variants; whatever the client library distinguishes internally collapses
/// into this taxonomy at the boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Credentials rejected by the monitoring service.
    #[error("authentication failed")]
    Authentication,

    /// The monitoring service is unreachable or reporting an outage.
    #[error("monitoring service unavailable")]
    ServiceUnavailable,

    /// The stored usercode was rejected by the remote service at command time.
    #[error("usercode rejected by the monitoring service")]
    InvalidCode,

    /// A command was refused for a reason other than code validity.
    #[error("command rejected (result code {code})")]
    CommandRejected { code: i32 },

    /// The service reported an arming-state value this library cannot map.
    #[error("unrecognized arming state {value}")]
    UnknownState { value: u32 },

    #[error("client error: {0}")]
    Other(String),
}

impl ClientError {
    /// Whether this failure must route to re-authentication rather than
    /// the next scheduled poll.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::Authentication)
    }
}
