//! Transport contract for Pulse.
//!
//! Pulse doesn't do network I/O. It drives an externally provided
//! transport through the [`Transport`] trait and receives its callbacks
//! as [`TransportEvent`]s on a channel, so that all of them are handled on
//! whichever task owns the receiving end.
//!
//! ```text
//! Session ──configure/connect/send_data──→ Transport
//!    ↑                                        │
//!    └──────── TransportEvent (mpsc) ─────────┘
//! ```
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryHub`], an in-process transport for tests
//!   and demos

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::{MemoryHub, MemoryTransport};

use std::fmt;

use pulse_protocol::{DeliveryMode, Packet, PacketData, PeerId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// SessionDescriptor
// ---------------------------------------------------------------------------

/// Credentials needed to join a real-time session.
///
/// Produced by an external matchmaking step and consumed once per
/// connection attempt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Host name or address of the session server.
    pub host: String,
    /// Port of the session server.
    pub port: u16,
    /// Short-lived token authorizing this client for the session.
    pub access_token: String,
}

impl SessionDescriptor {
    /// Creates a descriptor from its three parts.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            access_token: access_token.into(),
        }
    }
}

// Keeps the token out of logs.
impl fmt::Debug for SessionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SessionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A callback from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Another peer joined the session.
    PeerConnected(PeerId),
    /// Another peer left the session.
    PeerDisconnected(PeerId),
    /// The session became usable (`true`) or stopped being usable (`false`).
    ReadyChanged(bool),
    /// A packet arrived.
    PacketReceived(Packet),
}

/// A [`TransportEvent`] stamped with the connection attempt it belongs to.
///
/// Every call to `configure` starts a new generation. The session layer
/// uses it to recognise events still in flight from a connection it has
/// already replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// The connection attempt that produced the event.
    pub generation: u64,
    /// What happened.
    pub event: TransportEvent,
}

/// Receiving end of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Handle a transport uses to deliver its callbacks.
///
/// Cheap to clone. Sending never blocks, so a transport may call it from
/// any thread, including from inside `connect` or `send_data`.
#[derive(Debug, Clone)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSender {
    /// Creates a new event channel for the given generation.
    pub fn channel(generation: u64) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { generation, tx }, rx)
    }

    /// Returns a sender on the same channel for another generation.
    pub fn with_generation(&self, generation: u64) -> Self {
        Self {
            generation,
            tx: self.tx.clone(),
        }
    }

    /// The generation stamped on every event sent through this handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Delivers an event.
    ///
    /// Returns `false` if the receiving side is gone. Transports are
    /// expected to ignore that: nobody is listening any more.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(SessionEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// The contract Pulse needs from a real-time transport.
///
/// All methods are synchronous and must not block: outcomes (joined peers,
/// readiness, incoming packets) are reported later through the
/// [`EventSender`] given to [`configure`](Transport::configure).
///
/// `Send + 'static` because the transport is owned by the session actor
/// task.
pub trait Transport: Send + 'static {
    /// Prepares a connection attempt with the given credentials. Called
    /// once per attempt, before [`connect`](Transport::connect).
    fn configure(
        &mut self,
        descriptor: &SessionDescriptor,
        events: EventSender,
    ) -> Result<(), TransportError>;

    /// Starts connecting.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Leaves the session.
    fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Sends a packet to the other peers of the session (fire-and-forget).
    fn send_data(
        &mut self,
        op_code: i32,
        mode: DeliveryMode,
        data: PacketData,
    ) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn configure(
        &mut self,
        descriptor: &SessionDescriptor,
        events: EventSender,
    ) -> Result<(), TransportError> {
        (**self).configure(descriptor, events)
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        (**self).disconnect()
    }

    fn send_data(
        &mut self,
        op_code: i32,
        mode: DeliveryMode,
        data: PacketData,
    ) -> Result<(), TransportError> {
        (**self).send_data(op_code, mode, data)
    }
}
