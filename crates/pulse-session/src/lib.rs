//! Session management for Pulse.
//!
//! This crate owns the behavior of one real-time session:
//!
//! 1. **Lifecycle** - connecting, replacing and leaving a session
//!    ([`SessionManager`], [`SessionState`])
//! 2. **Latency probe** - answering pings, sending pings and turning pongs
//!    into [`Latency`] samples
//! 3. **Subscribers** - fanning [`LogEntry`]s and readiness changes out to
//!    registered listeners
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)     ← runs the manager on one task (pulse crate)
//!     ↕
//! Session Layer (this crate) ← dispatch, request ids, log entries
//!     ↕
//! Transport Layer (below)  ← Transport trait, SessionEvent channel
//!     ↕
//! Protocol Layer           ← Packet, PacketData, op codes
//! ```

mod entry;
mod error;
mod listeners;
mod manager;
mod request_id;
mod session;

pub use entry::{Direction, EntryKind, Latency, LogEntry, PacketDetails};
pub use error::SessionError;
pub use listeners::{LogListener, ReadyListener, SubscriptionId};
pub use manager::SessionManager;
pub use request_id::RequestIdSequence;
pub use session::{SessionSettings, SessionState};
