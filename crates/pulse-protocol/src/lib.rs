//! Packet protocol for Pulse.
//!
//! This crate defines what travels over a real-time session:
//!
//! - **Types** ([`Packet`], [`PacketData`], [`FieldValue`], [`PeerId`],
//!   [`DeliveryMode`]): the packet data model.
//! - **Op codes** ([`OpCode`], [`InboundMessage`]): how a received packet
//!   is interpreted.
//! - **Encoder** ([`packets`]): field maps for the empty, ping and pong
//!   packet kinds.
//! - **Clock** ([`Clock`], [`SystemClock`], [`FixedClock`]): timestamps
//!   for the latency probe.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): byte form of a packet,
//!   for transports that need one.
//!
//! # Architecture
//!
//! ```text
//! Session (log entries, latency) → Protocol (OpCode, PacketData) → Transport
//! ```
//!
//! The protocol layer doesn't know about connections or subscribers. It
//! only knows how packets are laid out.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod clock;
mod codec;
mod error;
mod opcode;
pub mod packets;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use opcode::{InboundMessage, OpCode};
pub use types::{
    DeliveryMode, FieldId, FieldValue, Packet, PacketData, PeerId,
};
