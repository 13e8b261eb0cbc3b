//! Error types for the session layer.

use pulse_transport::TransportError;

/// Errors that can occur during session management.
///
/// The session layer itself has no failure modes under normal input:
/// malformed packets are dropped and unknown op codes are logged. What
/// remains are failures reported by the transport it drives.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport rejected a configure, connect, disconnect or send.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
