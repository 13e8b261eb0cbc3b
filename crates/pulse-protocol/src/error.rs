//! Error types for the protocol layer.
//!
//! Each crate in Pulse defines its own error enum. A `ProtocolError`
//! always means a problem with the shape of a packet or its encoding,
//! never with the network.

use crate::FieldId;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a packet into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a packet).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A packet lacks a field its op code requires.
    ///
    /// The session layer treats this as transport-level corruption and
    /// drops the packet without telling subscribers.
    #[error("op code {op_code} is missing field {field}")]
    MissingField {
        /// Op code of the offending packet.
        op_code: i32,
        /// The field that was absent or had the wrong type.
        field: FieldId,
    },
}
