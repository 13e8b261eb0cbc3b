//! Log entries: the records subscribers receive for every send and
//! receive.
//!
//! Entries are built once and handed to listeners by shared reference, so
//! nothing downstream can change one after the fact.

use std::fmt;
use std::time::Duration;

use pulse_protocol::{Packet, PacketData, PeerId};
use serde::{Deserialize, Serialize};

/// Whether an entry describes something we received or something we did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Reported by the transport.
    Inbound,
    /// Initiated locally.
    Outbound,
}

/// What an entry is about.
///
/// `Display` gives the human-readable description stored in
/// [`LogEntry::description`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A peer joined the session.
    PeerConnected(PeerId),
    /// A peer left the session.
    PeerDisconnected(PeerId),
    /// The transport's readiness changed.
    ReadyChanged(bool),
    /// A ping arrived and will be answered.
    PingReceived {
        /// The id the peer put in the ping.
        request_id: i32,
    },
    /// A pong arrived; the entry carries a latency sample.
    PongReceived {
        /// The id echoed back, if the pong carried one.
        request_id: Option<i32>,
    },
    /// A packet with any other op code arrived.
    BlankReceived,
    /// We sent a blank packet.
    BlankSent,
    /// We sent a ping.
    PingSent {
        /// The request id allocated for it.
        request_id: i32,
    },
    /// We answered a ping.
    PongSent {
        /// The request id echoed back.
        request_id: i32,
    },
    /// We left the session.
    SessionLeft,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerConnected(peer) => write!(f, "Player {peer} Connected"),
            Self::PeerDisconnected(peer) => {
                write!(f, "Player {peer} Disconnected")
            }
            Self::ReadyChanged(ready) => write!(f, "Real Time Ready: {ready}"),
            Self::PingReceived { .. } => write!(f, "Ping Received"),
            Self::PongReceived { .. } => write!(f, "Pong Received"),
            Self::BlankReceived => write!(f, "Blank Packet Received"),
            Self::BlankSent => write!(f, "Sending Blank Packet"),
            Self::PingSent { .. } => write!(f, "Sending Ping Packet"),
            Self::PongSent { .. } => write!(f, "Sending Pong Packet"),
            Self::SessionLeft => write!(f, "Disconnected From Session"),
        }
    }
}

// ---------------------------------------------------------------------------
// PacketDetails
// ---------------------------------------------------------------------------

/// Packet accounting attached to an entry.
///
/// All-zero ([`Default`]) for entries that don't correspond to a packet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct PacketDetails {
    /// Op code of the packet, `0` if none.
    pub op_code: i32,
    /// Sender of an inbound packet. `PeerId(0)` for outbound packets.
    pub sender: PeerId,
    /// Wire size reported by the transport, `0` if unknown.
    pub packet_size: usize,
    /// Number of fields in the packet.
    pub field_count: usize,
}

impl PacketDetails {
    /// Details of a packet we are sending.
    pub fn outbound(op_code: i32, data: &PacketData) -> Self {
        Self {
            op_code,
            field_count: data.len(),
            ..Self::default()
        }
    }

    /// Details of a transport event that carries no packet.
    pub fn from_peer(sender: PeerId) -> Self {
        Self {
            sender,
            ..Self::default()
        }
    }
}

impl From<&Packet> for PacketDetails {
    fn from(packet: &Packet) -> Self {
        Self {
            op_code: packet.op_code,
            sender: packet.sender,
            packet_size: packet.packet_size,
            field_count: packet.data.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Latency
// ---------------------------------------------------------------------------

/// A round-trip sample taken from a pong.
///
/// `ping_time` is the timestamp we put in our ping and got echoed back;
/// `pong_time` is the responder's stamp. Both are nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latency {
    /// When the ping left, on our clock.
    pub ping_time: i64,
    /// When the pong was built, on the responder's clock.
    pub pong_time: i64,
}

impl Latency {
    /// Creates a sample from the two timestamps of a pong.
    pub fn new(ping_time: i64, pong_time: i64) -> Self {
        Self {
            ping_time,
            pong_time,
        }
    }

    /// `pong_time − ping_time`, in nanoseconds.
    ///
    /// Negative when the two clocks disagree by more than the round trip.
    pub fn value(&self) -> i64 {
        self.pong_time.saturating_sub(self.ping_time)
    }

    /// The sample as a `Duration`, or `None` if it is negative.
    pub fn as_duration(&self) -> Option<Duration> {
        u64::try_from(self.value()).ok().map(Duration::from_nanos)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ms", self.value() as f64 / 1_000_000.0)
    }
}

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

/// One protocol event, as delivered to log listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Structured form of the event.
    pub kind: EntryKind,
    /// Human-readable description, e.g. `"Pong Received"`.
    pub description: String,
    /// Latency sample; only set on received pongs.
    pub latency: Option<Latency>,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Packet accounting.
    pub details: PacketDetails,
}

impl LogEntry {
    /// An entry for something the transport reported.
    pub fn inbound(kind: EntryKind, details: PacketDetails) -> Self {
        Self::new(kind, Direction::Inbound, details)
    }

    /// An entry for something done locally.
    pub fn outbound(kind: EntryKind, details: PacketDetails) -> Self {
        Self::new(kind, Direction::Outbound, details)
    }

    fn new(kind: EntryKind, direction: Direction, details: PacketDetails) -> Self {
        Self {
            kind,
            description: kind.to_string(),
            latency: None,
            direction,
            details,
        }
    }

    /// Attaches a latency sample.
    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Direction::Inbound => "<-",
            Direction::Outbound => "->",
        };
        write!(f, "{arrow} {}", self.description)?;
        if self.details.op_code != 0 {
            write!(f, " [op {}]", self.details.op_code)?;
        }
        if let Some(latency) = self.latency {
            write!(f, " ({latency})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_descriptions() {
        assert_eq!(
            EntryKind::PeerConnected(PeerId(4)).to_string(),
            "Player 4 Connected"
        );
        assert_eq!(
            EntryKind::ReadyChanged(false).to_string(),
            "Real Time Ready: false"
        );
        assert_eq!(
            EntryKind::PongReceived { request_id: None }.to_string(),
            "Pong Received"
        );
        assert_eq!(
            EntryKind::SessionLeft.to_string(),
            "Disconnected From Session"
        );
    }

    #[test]
    fn test_latency_value_is_pong_minus_ping() {
        assert_eq!(Latency::new(1_000, 1_200).value(), 200);
    }

    #[test]
    fn test_latency_negative_has_no_duration() {
        let latency = Latency::new(1_200, 1_000);
        assert_eq!(latency.value(), -200);
        assert_eq!(latency.as_duration(), None);
    }

    #[test]
    fn test_latency_as_duration() {
        let latency = Latency::new(0, 2_500_000);
        assert_eq!(latency.as_duration(), Some(Duration::from_micros(2_500)));
        assert_eq!(latency.to_string(), "2.500ms");
    }

    #[test]
    fn test_packet_details_from_packet() {
        let mut data = PacketData::new();
        data.set_int(1, 1).set_long(2, 2);
        let mut packet = Packet::new(12, PeerId(3), data);
        packet.packet_size = 40;

        let details = PacketDetails::from(&packet);

        assert_eq!(
            details,
            PacketDetails {
                op_code: 12,
                sender: PeerId(3),
                packet_size: 40,
                field_count: 2,
            }
        );
    }

    #[test]
    fn test_log_entry_inbound_sets_description_and_direction() {
        let entry = LogEntry::inbound(
            EntryKind::BlankReceived,
            PacketDetails::default(),
        );
        assert_eq!(entry.description, "Blank Packet Received");
        assert_eq!(entry.direction, Direction::Inbound);
        assert!(entry.latency.is_none());
    }

    #[test]
    fn test_log_entry_display() {
        let entry = LogEntry::inbound(
            EntryKind::PongReceived {
                request_id: Some(1),
            },
            PacketDetails {
                op_code: 999,
                ..PacketDetails::default()
            },
        )
        .with_latency(Latency::new(0, 1_000_000));

        assert_eq!(entry.to_string(), "<- Pong Received [op 999] (1.000ms)");
    }
}
