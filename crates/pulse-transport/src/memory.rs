//! In-process transport: every [`MemoryTransport`] created from the same
//! [`MemoryHub`] is a peer of the same session.
//!
//! The hub behaves like a relay server would: joining announces the new
//! peer to everyone already there (and vice versa), a sent packet is
//! delivered to every OTHER joined peer, and leaving announces the
//! departure. Delivery is always reliable and in order, whatever
//! [`DeliveryMode`] is requested.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pulse_protocol::{Codec, DeliveryMode, JsonCodec, Packet, PacketData, PeerId};

use crate::{
    EventSender, SessionDescriptor, Transport, TransportError, TransportEvent,
};

#[derive(Debug, Default)]
struct HubState {
    next_peer: u32,
    /// Event senders of the peers currently joined, keyed by peer id.
    joined: BTreeMap<PeerId, EventSender>,
}

/// A shared in-process session. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport for a new peer. Peer ids start at 1.
    pub fn transport(&self) -> MemoryTransport {
        let peer_id = {
            let mut state = self.state.lock();
            state.next_peer += 1;
            PeerId(state.next_peer)
        };
        MemoryTransport {
            peer_id,
            hub: self.clone(),
            descriptor: None,
            events: None,
            joined: false,
        }
    }

    /// Number of peers currently joined.
    pub fn peer_count(&self) -> usize {
        self.state.lock().joined.len()
    }
}

/// One peer's end of a [`MemoryHub`].
#[derive(Debug)]
pub struct MemoryTransport {
    peer_id: PeerId,
    hub: MemoryHub,
    descriptor: Option<SessionDescriptor>,
    events: Option<EventSender>,
    joined: bool,
}

impl MemoryTransport {
    /// The id other peers see for this transport.
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Returns `true` while joined to the hub.
    pub fn is_connected(&self) -> bool {
        self.joined
    }
}

impl Transport for MemoryTransport {
    fn configure(
        &mut self,
        descriptor: &SessionDescriptor,
        events: EventSender,
    ) -> Result<(), TransportError> {
        if self.joined {
            // Re-route callbacks of the live connection to the new sender.
            self.hub
                .state
                .lock()
                .joined
                .insert(self.peer_id, events.clone());
        }
        tracing::debug!(
            peer = %self.peer_id,
            session = %descriptor,
            generation = events.generation(),
            "memory transport configured"
        );
        self.descriptor = Some(descriptor.clone());
        self.events = Some(events);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        let (Some(descriptor), Some(events)) = (&self.descriptor, &self.events)
        else {
            return Err(TransportError::NotConfigured);
        };
        if descriptor.access_token.is_empty() {
            return Err(TransportError::ConnectionRefused(
                "empty access token".into(),
            ));
        }
        if self.joined {
            return Ok(());
        }

        {
            let mut state = self.hub.state.lock();
            for (&other, other_events) in &state.joined {
                other_events.send(TransportEvent::PeerConnected(self.peer_id));
                events.send(TransportEvent::PeerConnected(other));
            }
            state.joined.insert(self.peer_id, events.clone());
        }
        self.joined = true;
        events.send(TransportEvent::ReadyChanged(true));

        tracing::debug!(peer = %self.peer_id, "memory transport joined hub");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        if !self.joined {
            return Ok(());
        }

        let own_events = {
            let mut state = self.hub.state.lock();
            let own = state.joined.remove(&self.peer_id);
            for other_events in state.joined.values() {
                other_events
                    .send(TransportEvent::PeerDisconnected(self.peer_id));
            }
            own
        };
        self.joined = false;
        if let Some(events) = own_events {
            events.send(TransportEvent::ReadyChanged(false));
        }

        tracing::debug!(peer = %self.peer_id, "memory transport left hub");
        Ok(())
    }

    fn send_data(
        &mut self,
        op_code: i32,
        mode: DeliveryMode,
        data: PacketData,
    ) -> Result<(), TransportError> {
        if !self.joined {
            return Err(TransportError::NotConnected);
        }

        let mut packet = Packet::new(op_code, self.peer_id, data);
        packet.packet_size = JsonCodec.encode(&packet)?.len();

        let state = self.hub.state.lock();
        let mut delivered = 0usize;
        for (_, other_events) in
            state.joined.iter().filter(|(id, _)| **id != self.peer_id)
        {
            if other_events
                .send(TransportEvent::PacketReceived(packet.clone()))
            {
                delivered += 1;
            }
        }

        tracing::trace!(
            peer = %self.peer_id,
            op_code,
            ?mode,
            size = packet.packet_size,
            delivered,
            "memory transport sent packet"
        );
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        // Leave the hub so other peers see the departure.
        let _ = self.disconnect();
    }
}
