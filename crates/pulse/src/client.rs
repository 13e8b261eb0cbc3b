//! `PulseClient` builder and handle.

use pulse_protocol::{Clock, DeliveryMode, SystemClock};
use pulse_session::{
    LogListener, ReadyListener, SessionManager, SessionSettings, SessionState,
    SubscriptionId,
};
use pulse_transport::{SessionDescriptor, Transport};
use tokio::sync::{mpsc, oneshot};

use crate::actor::{spawn_client, ClientCommand};
use crate::PulseError;

/// Default capacity of the actor's command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Builder for configuring and starting a Pulse client.
///
/// # Example
///
/// ```rust,no_run
/// use pulse::prelude::*;
///
/// # async fn run() -> Result<(), PulseError> {
/// let hub = MemoryHub::new();
/// let client = PulseClient::builder()
///     .delivery_mode(DeliveryMode::Unreliable)
///     .build(hub.transport());
/// client
///     .connect_session(SessionDescriptor::new("127.0.0.1", 7000, "token"))
///     .await?;
/// let request_id = client.send_timestamp_ping().await?;
/// # let _ = request_id;
/// # Ok(())
/// # }
/// ```
pub struct PulseClientBuilder<C: Clock = SystemClock> {
    settings: SessionSettings,
    command_buffer: usize,
    clock: C,
}

impl PulseClientBuilder {
    /// Creates a new builder with default settings and the system clock.
    pub fn new() -> Self {
        Self {
            settings: SessionSettings::default(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            clock: SystemClock::new(),
        }
    }
}

impl Default for PulseClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PulseClientBuilder<C> {
    /// Replaces the whole session configuration.
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the delivery mode used for every packet the client sends.
    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.settings.delivery_mode = mode;
        self
    }

    /// Sets the capacity of the command channel (minimum 1).
    pub fn command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity;
        self
    }

    /// Stamps pings and pongs with `clock` instead of the system clock.
    pub fn clock<C2: Clock>(self, clock: C2) -> PulseClientBuilder<C2> {
        PulseClientBuilder {
            settings: self.settings,
            command_buffer: self.command_buffer,
            clock,
        }
    }

    /// Spawns the client's actor task over `transport`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<T: Transport>(self, transport: T) -> PulseClient {
        let (manager, events) =
            SessionManager::with_clock(self.settings, transport, self.clock);
        let sender = spawn_client(manager, events, self.command_buffer);
        PulseClient { sender }
    }
}

/// Handle to a running Pulse client.
///
/// Cheap to clone: every clone talks to the same actor task. The actor
/// stops on [`shutdown`](Self::shutdown) or when the last handle is
/// dropped; the transport is dropped with it.
#[derive(Clone)]
pub struct PulseClient {
    sender: mpsc::Sender<ClientCommand>,
}

impl PulseClient {
    /// Creates a new builder.
    pub fn builder() -> PulseClientBuilder {
        PulseClientBuilder::new()
    }

    /// Connects to the session described by `descriptor`, replacing any
    /// current connection.
    ///
    /// Returns once the transport accepted the connect. Readiness is
    /// reported later to ready listeners.
    pub async fn connect_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<(), PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::Connect { descriptor, reply }, rx)
            .await?
            .map_err(PulseError::from)
    }

    /// Leaves the session. Log listeners always get a
    /// "Disconnected From Session" entry, even when this returns an error.
    pub async fn leave_session(&self) -> Result<(), PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::Leave { reply }, rx)
            .await?
            .map_err(PulseError::from)
    }

    /// Sends an empty packet under `op_code`.
    pub async fn send_blank_packet(&self, op_code: i32) -> Result<(), PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::SendBlank { op_code, reply }, rx)
            .await?
            .map_err(PulseError::from)
    }

    /// Sends a timestamped ping and returns its request id.
    pub async fn send_timestamp_ping(&self) -> Result<i32, PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::SendPing { reply }, rx)
            .await?
            .map_err(PulseError::from)
    }

    /// Registers a readiness listener.
    pub async fn subscribe_ready(
        &self,
        listener: ReadyListener,
    ) -> Result<SubscriptionId, PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::SubscribeReady { listener, reply }, rx)
            .await
    }

    /// Registers a log listener.
    pub async fn subscribe_log(
        &self,
        listener: LogListener,
    ) -> Result<SubscriptionId, PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::SubscribeLog { listener, reply }, rx)
            .await
    }

    /// Removes a listener. Returns `false` if `id` wasn't registered.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::Unsubscribe { id, reply }, rx).await
    }

    /// Current session state.
    pub async fn state(&self) -> Result<SessionState, PulseError> {
        let (reply, rx) = oneshot::channel();
        self.request(ClientCommand::GetState { reply }, rx).await
    }

    /// Stops the actor task. Later calls on any handle fail with
    /// [`PulseError::ClientClosed`].
    pub async fn shutdown(&self) -> Result<(), PulseError> {
        self.sender
            .send(ClientCommand::Shutdown)
            .await
            .map_err(|_| PulseError::ClientClosed)
    }

    /// Returns `true` once the actor task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<R>(
        &self,
        cmd: ClientCommand,
        rx: oneshot::Receiver<R>,
    ) -> Result<R, PulseError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| PulseError::ClientClosed)?;
        rx.await.map_err(|_| PulseError::ClientClosed)
    }
}
