//! Core packet types for Pulse.
//!
//! A packet on a real-time session is an op code plus a small map of
//! numbered, typed fields. The field ids are NOT self-describing: the
//! receiver has to know the op code to know what field 2 means.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ op_code: 998                 │  ← which kind of packet
//! │ sender:  P-2                 │  ← filled in by the transport
//! │ ┌──────────────────────────┐ │
//! │ │ 1 → Int(5)               │ │
//! │ │ 2 → Long(1_000)          │ │  ← the field map
//! │ └──────────────────────────┘ │
//! └──────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a peer (another participant) inside a real-time session.
///
/// Peer ids are assigned by the transport. `PeerId(0)` is used in log
/// records that have no sender, e.g. local bookkeeping events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric key of a field inside [`PacketData`].
pub type FieldId = u32;

// ---------------------------------------------------------------------------
// DeliveryMode
// ---------------------------------------------------------------------------

/// The delivery guarantee requested from the transport for a send.
///
/// Pulse never interprets this itself. It is stored in the session
/// settings and handed to the transport on every send.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum DeliveryMode {
    /// Delivered, in order, no loss.
    #[default]
    Reliable,

    /// May be lost or reordered.
    Unreliable,

    /// May be lost, but stale packets are discarded so the receiver only
    /// ever moves forward.
    UnreliableSequenced,
}

// ---------------------------------------------------------------------------
// FieldValue / PacketData
// ---------------------------------------------------------------------------

/// A single typed value stored under a field id.
///
/// `#[serde(tag = "type", content = "value")]` keeps the type next to the
/// value in JSON: `{ "type": "Long", "value": 1000 }`. The receiver needs
/// that tag because `Int(5)` and `Long(5)` are different on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer, used for timestamps.
    Long(i64),
    /// UTF-8 string.
    Str(String),
}

/// The ordered field map carried by a packet.
///
/// Backed by a `BTreeMap` so iteration (and therefore serialization) is
/// always in ascending field-id order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketData {
    fields: BTreeMap<FieldId, FieldValue>,
}

impl PacketData {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a 32-bit integer under `id`, replacing any previous value.
    pub fn set_int(&mut self, id: FieldId, value: i32) -> &mut Self {
        self.fields.insert(id, FieldValue::Int(value));
        self
    }

    /// Stores a 64-bit integer under `id`, replacing any previous value.
    pub fn set_long(&mut self, id: FieldId, value: i64) -> &mut Self {
        self.fields.insert(id, FieldValue::Long(value));
        self
    }

    /// Stores a string under `id`, replacing any previous value.
    pub fn set_str(
        &mut self,
        id: FieldId,
        value: impl Into<String>,
    ) -> &mut Self {
        self.fields.insert(id, FieldValue::Str(value.into()));
        self
    }

    /// Returns the raw value stored under `id`.
    pub fn get(&self, id: FieldId) -> Option<&FieldValue> {
        self.fields.get(&id)
    }

    /// Returns the field as an `i32`. Only `Int` values match.
    pub fn get_int(&self, id: FieldId) -> Option<i32> {
        match self.fields.get(&id)? {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the field as an `i64`.
    ///
    /// `Int` values are widened, which is lossless.
    pub fn get_long(&self, id: FieldId) -> Option<i64> {
        match self.fields.get(&id)? {
            FieldValue::Long(v) => Some(*v),
            FieldValue::Int(v) => Some(i64::from(*v)),
            FieldValue::Str(_) => None,
        }
    }

    /// Returns the field as a string slice.
    pub fn get_str(&self, id: FieldId) -> Option<&str> {
        match self.fields.get(&id)? {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(id, value)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }
}

impl FromIterator<(FieldId, FieldValue)> for PacketData {
    fn from_iter<I: IntoIterator<Item = (FieldId, FieldValue)>>(
        iter: I,
    ) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A packet as delivered by the transport to the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Identifies the packet kind. See [`OpCode`](crate::OpCode).
    pub op_code: i32,

    /// The peer that sent the packet.
    pub sender: PeerId,

    /// The typed field map.
    pub data: PacketData,

    /// Size of the packet on the wire in bytes, as measured by the
    /// transport. `0` when the transport doesn't report it.
    #[serde(default)]
    pub packet_size: usize,
}

impl Packet {
    /// Creates a packet with an unknown wire size.
    pub fn new(op_code: i32, sender: PeerId, data: PacketData) -> Self {
        Self {
            op_code,
            sender,
            data,
            packet_size: 0,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PeerId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_peer_id_default_is_zero() {
        assert_eq!(PeerId::default(), PeerId(0));
    }

    #[test]
    fn test_delivery_mode_default_is_reliable() {
        assert_eq!(DeliveryMode::default(), DeliveryMode::Reliable);
    }

    #[test]
    fn test_delivery_mode_serializes_as_pascal_case() {
        let json =
            serde_json::to_string(&DeliveryMode::UnreliableSequenced).unwrap();
        assert_eq!(json, "\"UnreliableSequenced\"");
    }

    #[test]
    fn test_set_int_then_get_int_returns_value() {
        let mut data = PacketData::new();
        data.set_int(1, 42);
        assert_eq!(data.get_int(1), Some(42));
    }

    #[test]
    fn test_get_int_on_long_field_returns_none() {
        // An `i64` can't be narrowed safely, so `get_int` refuses.
        let mut data = PacketData::new();
        data.set_long(2, 7);
        assert_eq!(data.get_int(2), None);
    }

    #[test]
    fn test_get_long_widens_int_field() {
        let mut data = PacketData::new();
        data.set_int(1, -5);
        assert_eq!(data.get_long(1), Some(-5));
    }

    #[test]
    fn test_get_long_on_string_field_returns_none() {
        let mut data = PacketData::new();
        data.set_str(1, "hello");
        assert_eq!(data.get_long(1), None);
        assert_eq!(data.get_str(1), Some("hello"));
    }

    #[test]
    fn test_get_missing_field_returns_none() {
        let data = PacketData::new();
        assert!(data.get(1).is_none());
        assert_eq!(data.get_int(1), None);
        assert_eq!(data.get_long(1), None);
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let mut data = PacketData::new();
        data.set_int(1, 1).set_long(1, 99);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(1), Some(&FieldValue::Long(99)));
    }

    #[test]
    fn test_iter_yields_ascending_field_ids() {
        let mut data = PacketData::new();
        data.set_long(3, 30).set_int(1, 10).set_long(2, 20);
        let ids: Vec<FieldId> = data.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_packet_data_json_keeps_value_types() {
        let mut data = PacketData::new();
        data.set_int(1, 5).set_long(2, 1000);
        let json: serde_json::Value = serde_json::to_value(&data).unwrap();

        assert_eq!(json["1"]["type"], "Int");
        assert_eq!(json["2"]["type"], "Long");
        assert_eq!(json["2"]["value"], 1000);
    }

    #[test]
    fn test_packet_size_defaults_when_missing() {
        let json = r#"{ "op_code": 1, "sender": 2, "data": {} }"#;
        let packet: Packet = serde_json::from_str(json).unwrap();
        assert_eq!(packet.packet_size, 0);
        assert_eq!(packet.sender, PeerId(2));
        assert!(packet.data.is_empty());
    }
}
