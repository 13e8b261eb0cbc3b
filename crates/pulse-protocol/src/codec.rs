//! Codec trait and implementations for turning packets into bytes.
//!
//! The session layer never sees bytes: byte framing belongs to the
//! transport. Transports that need a byte form of a [`Packet`] (to put it
//! on a socket, or just to report how big it would be) go through the
//! [`Codec`] trait so the format can be swapped without touching anyone
//! else.
//!
//! [`Packet`]: crate::Packet

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads; a transport may hold
///   its codec inside an `Arc` shared with other peers.
/// - `'static` → the codec owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, so packets can be logged and inspected as they are.
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use pulse_protocol::{packets, Codec, JsonCodec, Packet, PeerId};
///
/// let codec = JsonCodec;
/// let packet = Packet::new(7, PeerId(1), packets::empty());
///
/// let bytes = codec.encode(&packet).unwrap();
/// let decoded: Packet = codec.decode(&bytes).unwrap();
/// assert_eq!(packet, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
