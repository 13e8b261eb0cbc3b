//! Unified error type for Pulse.

use pulse_protocol::ProtocolError;
use pulse_session::SessionError;
use pulse_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `pulse` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
///
/// [`PulseClient`](crate::PulseClient) operations report protocol and
/// transport failures inside [`PulseError::Session`]. The `Protocol` and
/// `Transport` variants carry errors from hosts that use
/// [`pulse::protocol`](crate::protocol) or a transport directly.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// A protocol-level error (encode, decode, missing field) from direct
    /// use of a codec or `InboundMessage::decode`.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport-level error (configure, connect, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session-level error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client's actor task has stopped; no command can reach it.
    #[error("pulse client is closed")]
    ClientClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionRefused("gone".into());
        let pulse_err: PulseError = err.into();
        assert!(matches!(pulse_err, PulseError::Transport(_)));
        assert!(pulse_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::MissingField {
            op_code: 998,
            field: 2,
        };
        let pulse_err: PulseError = err.into();
        assert!(matches!(pulse_err, PulseError::Protocol(_)));
    }

    #[test]
    fn test_codec_decode_failure_converts_with_question_mark() {
        use pulse_protocol::{Codec, JsonCodec, Packet};

        fn decode(bytes: &[u8]) -> Result<Packet, PulseError> {
            Ok(JsonCodec.decode(bytes)?)
        }

        let result = decode(b"not json");
        assert!(matches!(
            result,
            Err(PulseError::Protocol(ProtocolError::Decode(_)))
        ));
    }

    #[test]
    fn test_from_session_error_is_transparent() {
        let err = SessionError::from(TransportError::NotConnected);
        let pulse_err: PulseError = err.into();
        assert!(matches!(pulse_err, PulseError::Session(_)));
        assert_eq!(pulse_err.to_string(), "transport is not connected");
    }

    #[test]
    fn test_client_closed_message() {
        assert_eq!(
            PulseError::ClientClosed.to_string(),
            "pulse client is closed"
        );
    }
}
