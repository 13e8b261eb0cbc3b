//! The session manager: owns one real-time session and its ping/pong
//! latency probe.
//!
//! It's responsible for:
//! - Configuring and connecting the transport from a [`SessionDescriptor`]
//! - Turning transport events into [`LogEntry`]s for subscribers
//! - Answering pings and measuring latency from pongs
//! - Sending blank packets and pings on request
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself: every method takes
//! `&mut self` and there is no locking inside. The transport delivers its
//! callbacks on a channel ([`EventReceiver`]) instead of calling into the
//! manager, and whoever owns the manager drains that channel through
//! [`handle_event`](SessionManager::handle_event). The `pulse` crate does
//! that from a single Tokio task, which keeps every state change on one
//! sequencing context.
//!
//! # Ping correlation
//!
//! There is no table of outstanding pings. Any pong is accepted as the
//! answer to one of ours and produces a latency sample, even if its
//! request id was never issued by this instance.

use pulse_protocol::{
    packets, Clock, InboundMessage, OpCode, Packet, PacketData, SystemClock,
};
use pulse_transport::{
    EventReceiver, EventSender, SessionDescriptor, SessionEvent, Transport,
    TransportEvent,
};

use crate::listeners::Listeners;
use crate::{
    EntryKind, Latency, LogEntry, LogListener, PacketDetails, ReadyListener,
    RequestIdSequence, SessionError, SessionSettings, SessionState,
    SubscriptionId,
};

/// Manages one real-time session over a [`Transport`].
///
/// ## Lifecycle
///
/// ```text
/// connect_session() ──→ [Connecting] ──ReadyChanged(b)──→ [Ready(b)]
///        ↑                                                    │
///        └──────────────── [Disconnected] ←── leave_session() ┘
/// ```
pub struct SessionManager<T: Transport, C: Clock = SystemClock> {
    settings: SessionSettings,
    transport: T,
    clock: C,
    requests: RequestIdSequence,
    listeners: Listeners,
    state: SessionState,

    /// Incremented by every `connect_session`; events stamped with an
    /// older value belong to a replaced connection.
    generation: u64,

    /// Sender side of the event channel. Cloned, with the current
    /// generation, into the transport on every connect.
    events: EventSender,
}

impl<T: Transport> SessionManager<T> {
    /// Creates a manager that stamps pings with the system clock.
    ///
    /// Returns the receiving end of the transport event channel; feed
    /// everything that arrives on it to
    /// [`handle_event`](Self::handle_event).
    pub fn new(settings: SessionSettings, transport: T) -> (Self, EventReceiver) {
        Self::with_clock(settings, transport, SystemClock::new())
    }
}

impl<T: Transport, C: Clock> SessionManager<T, C> {
    /// Creates a manager with a custom clock.
    pub fn with_clock(
        settings: SessionSettings,
        transport: T,
        clock: C,
    ) -> (Self, EventReceiver) {
        let (events, receiver) = EventSender::channel(0);
        let manager = Self {
            settings,
            transport,
            clock,
            requests: RequestIdSequence::new(),
            listeners: Listeners::new(),
            state: SessionState::Idle,
            generation: 0,
            events,
        };
        (manager, receiver)
    }

    // -- Accessors --------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The static settings this manager was built with.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Generation of the current (or last) connection attempt. `0` before
    /// the first `connect_session`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The most recently issued ping request id.
    pub fn last_request_id(&self) -> i32 {
        self.requests.current()
    }

    /// Shared access to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exclusive access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -- Subscriptions ----------------------------------------------------

    /// Registers a readiness listener. Registering the same `Arc` again
    /// returns the existing id and adds nothing.
    pub fn subscribe_ready(&mut self, listener: ReadyListener) -> SubscriptionId {
        self.listeners.subscribe_ready(listener)
    }

    /// Registers a log listener. Registering the same `Arc` again returns
    /// the existing id and adds nothing.
    pub fn subscribe_log(&mut self, listener: LogListener) -> SubscriptionId {
        self.listeners.subscribe_log(listener)
    }

    /// Removes a listener of either kind. Returns `false` if `id` wasn't
    /// registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // -- Commands ---------------------------------------------------------

    /// Configures the transport with `descriptor` and starts connecting.
    ///
    /// Outcomes arrive later as transport events. If a connection is
    /// already pending or established it is replaced: the transport is
    /// disconnected first, and events still in flight from the old
    /// connection are ignored.
    ///
    /// # Errors
    /// Returns [`SessionError::Transport`] if the transport rejects the
    /// configuration or the connect; the state is then `Disconnected`.
    pub fn connect_session(
        &mut self,
        descriptor: &SessionDescriptor,
    ) -> Result<(), SessionError> {
        if self.state.is_active() {
            tracing::info!(
                generation = self.generation,
                "replacing active session connection"
            );
            self.transport.disconnect()?;
        }

        self.generation += 1;
        self.requests = RequestIdSequence::new();
        self.state = SessionState::Connecting;

        let events = self.events.with_generation(self.generation);
        let result = self
            .transport
            .configure(descriptor, events)
            .and_then(|()| self.transport.connect());
        if let Err(e) = result {
            tracing::warn!(
                session = %descriptor,
                error = %e,
                "session connect failed"
            );
            self.state = SessionState::Disconnected;
            return Err(e.into());
        }

        tracing::info!(
            session = %descriptor,
            generation = self.generation,
            "connecting session"
        );
        Ok(())
    }

    /// Disconnects the transport and reports it to log listeners.
    ///
    /// Always emits exactly one outbound "Disconnected From Session" entry
    /// with zeroed details, whatever state the session was in. Nothing is
    /// sent on the wire.
    ///
    /// # Errors
    /// Returns the transport's disconnect error, after the entry has been
    /// emitted.
    pub fn leave_session(&mut self) -> Result<(), SessionError> {
        let result = self.transport.disconnect();
        self.state = SessionState::Disconnected;
        tracing::info!(generation = self.generation, "left session");
        self.emit(LogEntry::outbound(
            EntryKind::SessionLeft,
            PacketDetails::default(),
        ));
        result.map_err(SessionError::from)
    }

    /// Sends an empty packet under a caller-chosen op code.
    pub fn send_blank_packet(&mut self, op_code: i32) -> Result<(), SessionError> {
        let details = self.send(op_code, packets::empty())?;
        self.emit(LogEntry::outbound(EntryKind::BlankSent, details));
        Ok(())
    }

    /// Sends a timestamped ping and returns its request id.
    pub fn send_timestamp_ping(&mut self) -> Result<i32, SessionError> {
        let request_id = self.requests.next_id();
        let data = packets::timestamp_ping(request_id, &self.clock);
        let details = self.send(OpCode::TIMESTAMP_PING, data)?;
        self.emit(LogEntry::outbound(
            EntryKind::PingSent { request_id },
            details,
        ));
        Ok(request_id)
    }

    // -- Transport events -------------------------------------------------

    /// Processes one transport event.
    ///
    /// Events from a replaced connection are discarded.
    ///
    /// # Errors
    /// Only answering a ping can fail, when the transport rejects the pong.
    pub fn handle_event(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        if event.generation != self.generation {
            tracing::trace!(
                stale = event.generation,
                current = self.generation,
                "ignoring event from replaced connection"
            );
            return Ok(());
        }

        match event.event {
            TransportEvent::PeerConnected(peer) => {
                tracing::debug!(%peer, "peer connected");
                self.emit(LogEntry::inbound(
                    EntryKind::PeerConnected(peer),
                    PacketDetails::from_peer(peer),
                ));
            }
            TransportEvent::PeerDisconnected(peer) => {
                tracing::debug!(%peer, "peer disconnected");
                self.emit(LogEntry::inbound(
                    EntryKind::PeerDisconnected(peer),
                    PacketDetails::from_peer(peer),
                ));
            }
            TransportEvent::ReadyChanged(ready) => self.on_ready_changed(ready),
            TransportEvent::PacketReceived(packet) => self.on_packet(&packet)?,
        }
        Ok(())
    }

    fn on_ready_changed(&mut self, ready: bool) {
        if self.state.is_active() {
            self.state = SessionState::Ready(ready);
        }
        tracing::info!(ready, state = %self.state, "session readiness changed");
        self.emit(LogEntry::inbound(
            EntryKind::ReadyChanged(ready),
            PacketDetails::default(),
        ));
        self.listeners.notify_ready(ready);
    }

    fn on_packet(&mut self, packet: &Packet) -> Result<(), SessionError> {
        let message = match InboundMessage::decode(packet) {
            Ok(message) => message,
            Err(e) => {
                tracing::trace!(
                    sender = %packet.sender,
                    error = %e,
                    "dropping malformed packet"
                );
                return Ok(());
            }
        };

        let details = PacketDetails::from(packet);
        match message {
            InboundMessage::Ping {
                request_id,
                sent_at,
            } => {
                tracing::debug!(sender = %packet.sender, request_id, "ping received");
                self.emit(LogEntry::inbound(
                    EntryKind::PingReceived { request_id },
                    details,
                ));
                self.send_timestamp_pong(request_id, sent_at)?;
            }
            InboundMessage::Pong {
                request_id,
                ping_time,
                pong_time,
            } => {
                let latency = Latency::new(ping_time, pong_time);
                tracing::debug!(
                    sender = %packet.sender,
                    ?request_id,
                    latency_ns = latency.value(),
                    "pong received"
                );
                self.emit(
                    LogEntry::inbound(
                        EntryKind::PongReceived { request_id },
                        details,
                    )
                    .with_latency(latency),
                );
            }
            InboundMessage::Blank(op_code) => {
                tracing::debug!(sender = %packet.sender, op_code, "blank packet received");
                self.emit(LogEntry::inbound(EntryKind::BlankReceived, details));
            }
        }
        Ok(())
    }

    fn send_timestamp_pong(
        &mut self,
        request_id: i32,
        ping_time: i64,
    ) -> Result<(), SessionError> {
        let data = packets::timestamp_pong(request_id, ping_time, &self.clock);
        let details = self.send(OpCode::TIMESTAMP_PONG, data)?;
        self.emit(LogEntry::outbound(
            EntryKind::PongSent { request_id },
            details,
        ));
        Ok(())
    }

    // -- Helpers ----------------------------------------------------------

    /// Hands a packet to the transport with the configured delivery mode.
    fn send(
        &mut self,
        op_code: i32,
        data: PacketData,
    ) -> Result<PacketDetails, SessionError> {
        let details = PacketDetails::outbound(op_code, &data);
        let mode = self.settings.delivery_mode;
        self.transport.send_data(op_code, mode, data)?;
        tracing::debug!(op_code, ?mode, fields = details.field_count, "packet sent");
        Ok(details)
    }

    fn emit(&self, entry: LogEntry) {
        self.listeners.notify_log(&entry);
    }
}

// =========================================================================
// Tests
// =========================================================================
