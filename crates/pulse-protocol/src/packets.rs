//! Packet encoder: builds the field map for each outbound packet kind.
//!
//! | kind  | field 1          | field 2              | field 3            |
//! |-------|------------------|----------------------|--------------------|
//! | empty | `Int` sentinel 1 | -                    | -                  |
//! | ping  | `Int` request id | `Long` send time     | -                  |
//! | pong  | `Int` request id | `Long` ping send time| `Long` reply time  |
//!
//! None of these can fail. The only side effect is reading the clock.

use crate::{Clock, PacketData};

/// Field ids shared by the ping and pong layouts.
pub mod field {
    use crate::FieldId;

    /// Sentinel of the empty packet.
    pub const SENTINEL: FieldId = 1;
    /// Request id of a ping, echoed by the pong.
    pub const REQUEST_ID: FieldId = 1;
    /// Time the ping left its sender, echoed unchanged by the pong.
    pub const PING_TIME: FieldId = 2;
    /// Time the responder built the pong.
    pub const PONG_TIME: FieldId = 3;
}

/// Value stored in the empty packet's only field.
pub const EMPTY_SENTINEL: i32 = 1;

/// Builds the payload of a blank packet.
///
/// Some transports can't serialize a zero-field payload, so the "empty"
/// packet carries one sentinel field.
pub fn empty() -> PacketData {
    let mut data = PacketData::new();
    data.set_int(field::SENTINEL, EMPTY_SENTINEL);
    data
}

/// Builds a ping stamped with the current time.
pub fn timestamp_ping(request_id: i32, clock: &impl Clock) -> PacketData {
    let mut data = PacketData::new();
    data.set_int(field::REQUEST_ID, request_id)
        .set_long(field::PING_TIME, clock.now().as_nanos());
    data
}

/// Builds the reply to a ping.
///
/// `ping_time` is the ping's own timestamp and is copied through untouched;
/// field 3 is this side's clock, for the responder's own bookkeeping.
pub fn timestamp_pong(
    request_id: i32,
    ping_time: i64,
    clock: &impl Clock,
) -> PacketData {
    let mut data = PacketData::new();
    data.set_int(field::REQUEST_ID, request_id)
        .set_long(field::PING_TIME, ping_time)
        .set_long(field::PONG_TIME, clock.now().as_nanos());
    data
}
