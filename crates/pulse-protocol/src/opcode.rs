//! Op codes and decoding of inbound packets.
//!
//! Op codes 998 and 999 are reserved for the latency probe. Every other
//! value is application-defined and, as far as this crate is concerned,
//! a "blank" packet.

use std::fmt;

use crate::packets::field;
use crate::{FieldId, Packet, ProtocolError};

/// Known packet kinds, keyed by op code.
///
/// The conversion from `i32` is total: unknown codes land in
/// [`OpCode::Other`], so a `match` on this enum always covers every
/// packet the transport can hand us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Latency probe request.
    TimestampPing,
    /// Reply to a latency probe.
    TimestampPong,
    /// Any application-defined op code.
    Other(i32),
}

impl OpCode {
    /// Wire value of [`OpCode::TimestampPing`].
    pub const TIMESTAMP_PING: i32 = 998;
    /// Wire value of [`OpCode::TimestampPong`].
    pub const TIMESTAMP_PONG: i32 = 999;

    /// Returns the wire value.
    pub fn code(self) -> i32 {
        i32::from(self)
    }
}

impl From<i32> for OpCode {
    fn from(code: i32) -> Self {
        match code {
            Self::TIMESTAMP_PING => Self::TimestampPing,
            Self::TIMESTAMP_PONG => Self::TimestampPong,
            other => Self::Other(other),
        }
    }
}

impl From<OpCode> for i32 {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::TimestampPing => OpCode::TIMESTAMP_PING,
            OpCode::TimestampPong => OpCode::TIMESTAMP_PONG,
            OpCode::Other(code) => code,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampPing => write!(f, "TimestampPing"),
            Self::TimestampPong => write!(f, "TimestampPong"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

// ---------------------------------------------------------------------------
// InboundMessage
// ---------------------------------------------------------------------------

/// A received packet interpreted according to its op code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A peer wants us to echo its timestamp back.
    Ping {
        /// The peer's request id.
        request_id: i32,
        /// When the peer sent the ping, on the peer's clock.
        sent_at: i64,
    },

    /// A peer answered one of our pings.
    Pong {
        /// The id the pong claims to answer. Not needed for latency.
        request_id: Option<i32>,
        /// The timestamp we put in the ping, echoed back.
        ping_time: i64,
        /// When the responder built the pong.
        pong_time: i64,
    },

    /// Any other op code. Carries no decoded content.
    Blank(i32),
}

impl InboundMessage {
    /// Decodes `packet` by op code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingField`] if a ping or pong lacks one
    /// of the fields its layout requires. Blank packets never fail.
    pub fn decode(packet: &Packet) -> Result<Self, ProtocolError> {
        let data = &packet.data;
        match OpCode::from(packet.op_code) {
            OpCode::TimestampPing => {
                let request_id = data
                    .get_int(field::REQUEST_ID)
                    .ok_or_else(|| missing(packet, field::REQUEST_ID))?;
                let sent_at = data
                    .get_long(field::PING_TIME)
                    .ok_or_else(|| missing(packet, field::PING_TIME))?;
                Ok(Self::Ping {
                    request_id,
                    sent_at,
                })
            }
            OpCode::TimestampPong => {
                let ping_time = data
                    .get_long(field::PING_TIME)
                    .ok_or_else(|| missing(packet, field::PING_TIME))?;
                let pong_time = data
                    .get_long(field::PONG_TIME)
                    .ok_or_else(|| missing(packet, field::PONG_TIME))?;
                Ok(Self::Pong {
                    request_id: data.get_int(field::REQUEST_ID),
                    ping_time,
                    pong_time,
                })
            }
            OpCode::Other(code) => Ok(Self::Blank(code)),
        }
    }
}

fn missing(packet: &Packet, field: FieldId) -> ProtocolError {
    ProtocolError::MissingField {
        op_code: packet.op_code,
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{packets, FixedClock, PacketData, PeerId};

    fn packet(op_code: i32, data: PacketData) -> Packet {
        Packet::new(op_code, PeerId(2), data)
    }

    #[test]
    fn test_op_code_from_reserved_values() {
        assert_eq!(OpCode::from(998), OpCode::TimestampPing);
        assert_eq!(OpCode::from(999), OpCode::TimestampPong);
    }

    #[test]
    fn test_op_code_from_unknown_value_is_other() {
        assert_eq!(OpCode::from(1), OpCode::Other(1));
        assert_eq!(OpCode::from(-3), OpCode::Other(-3));
    }

    #[test]
    fn test_op_code_into_i32_inverts_from() {
        for code in [0, 1, 997, 998, 999, 1000, i32::MAX] {
            assert_eq!(OpCode::from(code).code(), code);
        }
    }

    #[test]
    fn test_decode_ping_reads_fields_one_and_two() {
        let mut data = PacketData::new();
        data.set_int(1, 5).set_long(2, 1_000);

        let msg = InboundMessage::decode(&packet(998, data)).unwrap();

        assert_eq!(
            msg,
            InboundMessage::Ping {
                request_id: 5,
                sent_at: 1_000
            }
        );
    }

    #[test]
    fn test_decode_ping_missing_timestamp_returns_error() {
        let mut data = PacketData::new();
        data.set_int(1, 5);

        let result = InboundMessage::decode(&packet(998, data));

        assert!(matches!(
            result,
            Err(ProtocolError::MissingField {
                op_code: 998,
                field: 2
            })
        ));
    }

    #[test]
    fn test_decode_ping_missing_request_id_returns_error() {
        let mut data = PacketData::new();
        data.set_long(2, 1_000);

        let result = InboundMessage::decode(&packet(998, data));

        assert!(matches!(
            result,
            Err(ProtocolError::MissingField { field: 1, .. })
        ));
    }

    #[test]
    fn test_decode_pong_without_request_id_still_decodes() {
        let mut data = PacketData::new();
        data.set_long(2, 1_000).set_long(3, 1_200);

        let msg = InboundMessage::decode(&packet(999, data)).unwrap();

        assert_eq!(
            msg,
            InboundMessage::Pong {
                request_id: None,
                ping_time: 1_000,
                pong_time: 1_200
            }
        );
    }

    #[test]
    fn test_decode_pong_missing_reply_time_returns_error() {
        let mut data = PacketData::new();
        data.set_int(1, 5).set_long(2, 1_000);

        let result = InboundMessage::decode(&packet(999, data));

        assert!(matches!(
            result,
            Err(ProtocolError::MissingField {
                op_code: 999,
                field: 3
            })
        ));
    }

    #[test]
    fn test_decode_unknown_op_code_is_blank() {
        let msg = InboundMessage::decode(&packet(42, packets::empty())).unwrap();
        assert_eq!(msg, InboundMessage::Blank(42));
    }

    #[test]
    fn test_decode_encoded_ping_and_pong_preserve_fields() {
        let clock = FixedClock::new(5_000);

        let ping = packet(998, packets::timestamp_ping(17, &clock));
        let Ok(InboundMessage::Ping {
            request_id,
            sent_at,
        }) = InboundMessage::decode(&ping)
        else {
            panic!("expected a ping");
        };
        assert_eq!((request_id, sent_at), (17, 5_000));

        clock.advance(250);
        let pong =
            packet(999, packets::timestamp_pong(request_id, sent_at, &clock));
        let decoded = InboundMessage::decode(&pong).unwrap();
        assert_eq!(
            decoded,
            InboundMessage::Pong {
                request_id: Some(17),
                ping_time: 5_000,
                pong_time: 5_250
            }
        );
    }
}
