//! # Pulse
//!
//! Real-time session probe: connect to a session through a pluggable
//! transport, answer pings, and measure round-trip latency from pongs.
//!
//! The [`PulseClient`] runs a [`SessionManager`](pulse_session::SessionManager)
//! on its own Tokio task and exposes it through a cloneable async handle.
//! Subscribers receive every send and receive as a [`LogEntry`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pulse::prelude::*;
//!
//! # async fn run() -> Result<(), PulseError> {
//! let hub = MemoryHub::new();
//! let client = PulseClient::builder().build(hub.transport());
//! client
//!     .subscribe_log(Arc::new(|entry: &LogEntry| println!("{entry}")))
//!     .await?;
//! client
//!     .connect_session(SessionDescriptor::new("127.0.0.1", 7000, "token"))
//!     .await?;
//! client.send_timestamp_ping().await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod client;
mod error;

pub use client::{PulseClient, PulseClientBuilder, DEFAULT_COMMAND_BUFFER};
pub use error::PulseError;

pub use pulse_protocol as protocol;
pub use pulse_session as session;
pub use pulse_transport as transport;

/// The types most applications need.
pub mod prelude {
    pub use crate::{PulseClient, PulseClientBuilder, PulseError};
    pub use pulse_protocol::{
        Clock, DeliveryMode, FixedClock, OpCode, Packet, PacketData, PeerId,
        SystemClock,
    };
    pub use pulse_session::{
        Direction, EntryKind, Latency, LogEntry, LogListener, PacketDetails,
        ReadyListener, SessionSettings, SessionState, SubscriptionId,
    };
    #[cfg(feature = "memory")]
    pub use pulse_transport::{MemoryHub, MemoryTransport};
    pub use pulse_transport::{
        EventSender, SessionDescriptor, Transport, TransportError,
        TransportEvent,
    };
}
