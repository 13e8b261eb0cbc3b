//! The client actor: one Tokio task that owns the [`SessionManager`].
//!
//! Commands from [`PulseClient`](crate::PulseClient) handles and events
//! from the transport are drained by the same `select!` loop, so the
//! manager only ever sees one of them at a time.

use pulse_protocol::Clock;
use pulse_session::{
    LogListener, ReadyListener, SessionError, SessionManager, SessionState,
    SubscriptionId,
};
use pulse_transport::{EventReceiver, SessionDescriptor, Transport};
use tokio::sync::{mpsc, oneshot};

/// Commands sent from client handles to the actor.
///
/// The `oneshot::Sender` in each variant is the reply channel: the actor
/// sends the result back through it.
pub(crate) enum ClientCommand {
    Connect {
        descriptor: SessionDescriptor,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Leave {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SendBlank {
        op_code: i32,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SendPing {
        reply: oneshot::Sender<Result<i32, SessionError>>,
    },
    SubscribeReady {
        listener: ReadyListener,
        reply: oneshot::Sender<SubscriptionId>,
    },
    SubscribeLog {
        listener: LogListener,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    GetState {
        reply: oneshot::Sender<SessionState>,
    },
    Shutdown,
}

struct ClientActor<T: Transport, C: Clock> {
    manager: SessionManager<T, C>,
    commands: mpsc::Receiver<ClientCommand>,
    events: EventReceiver,
}

impl<T: Transport, C: Clock> ClientActor<T, C> {
    /// Runs until shutdown or until every client handle is dropped.
    async fn run(mut self) {
        tracing::info!("pulse client actor started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(ClientCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(event) = self.events.recv() => {
                    if let Err(e) = self.manager.handle_event(event) {
                        tracing::warn!(
                            error = %e,
                            generation = self.manager.generation(),
                            "failed to handle transport event"
                        );
                    }
                }
            }
        }

        tracing::info!(
            state = %self.manager.state(),
            "pulse client actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: ClientCommand) {
        // A dropped reply receiver means the caller stopped waiting.
        match cmd {
            ClientCommand::Connect { descriptor, reply } => {
                let _ = reply.send(self.manager.connect_session(&descriptor));
            }
            ClientCommand::Leave { reply } => {
                let _ = reply.send(self.manager.leave_session());
            }
            ClientCommand::SendBlank { op_code, reply } => {
                let _ = reply.send(self.manager.send_blank_packet(op_code));
            }
            ClientCommand::SendPing { reply } => {
                let _ = reply.send(self.manager.send_timestamp_ping());
            }
            ClientCommand::SubscribeReady { listener, reply } => {
                let _ = reply.send(self.manager.subscribe_ready(listener));
            }
            ClientCommand::SubscribeLog { listener, reply } => {
                let _ = reply.send(self.manager.subscribe_log(listener));
            }
            ClientCommand::Unsubscribe { id, reply } => {
                let _ = reply.send(self.manager.unsubscribe(id));
            }
            ClientCommand::GetState { reply } => {
                let _ = reply.send(self.manager.state());
            }
            ClientCommand::Shutdown => {}
        }
    }
}

/// Spawns the actor as a Tokio task and returns its command sender.
///
/// `command_buffer` controls backpressure: once the channel is full,
/// client calls wait. Must be called from within a Tokio runtime.
pub(crate) fn spawn_client<T: Transport, C: Clock>(
    manager: SessionManager<T, C>,
    events: EventReceiver,
    command_buffer: usize,
) -> mpsc::Sender<ClientCommand> {
    let (tx, rx) = mpsc::channel(command_buffer.max(1));

    let actor = ClientActor {
        manager,
        commands: rx,
        events,
    };
    tokio::spawn(actor.run());

    tx
}
