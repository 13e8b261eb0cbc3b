use pulse_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `connect` was called before `configure`.
    #[error("transport is not configured")]
    NotConfigured,

    /// The operation needs an established connection.
    #[error("transport is not connected")]
    NotConnected,

    /// The remote end refused the connection attempt.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The packet couldn't be framed for the wire.
    #[error("packet framing failed: {0}")]
    Framing(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_from_protocol_error() {
        let err: TransportError = ProtocolError::MissingField {
            op_code: 999,
            field: 3,
        }
        .into();
        assert!(matches!(err, TransportError::Framing(_)));
        assert!(err.to_string().starts_with("packet framing failed"));
    }

    #[test]
    fn test_connection_refused_message_keeps_reason() {
        let err = TransportError::ConnectionRefused("empty access token".into());
        assert_eq!(err.to_string(), "connection refused: empty access token");
    }
}
