//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are handled one at a time, so every
//! mutation of a room is serialized without locks. The same loop also
//! polls the room's vote timer and its idle sweep.

use std::collections::HashMap;

use bingo_protocol::{ClientEvent, ConnectionId, RoomCode, ServerEvent};
use bingo_timer::{DeadlineTimer, SweepInterval};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::room::Outbox;
use crate::{Room, RoomError, RoomInfo};

/// Channel for delivering events to one connection's writer task.
pub type ConnectionSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// An event from a connection. `sender` reaches that connection.
    Event {
        conn: ConnectionId,
        sender: ConnectionSender,
        event: ClientEvent,
    },

    /// The connection closed.
    Disconnected { conn: ConnectionId },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. The
/// [`RoomRegistry`](crate::RoomRegistry) holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Forwards a client event to the room (fire-and-forget).
    ///
    /// Replies, including rejections, arrive on `sender`.
    pub async fn send_event(
        &self,
        conn: ConnectionId,
        sender: ConnectionSender,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event {
                conn,
                sender,
                event,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room a connection closed.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnected { conn })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down.
    ///
    /// Public API, reached through [`RoomRegistry::destroy_room`](crate::RoomRegistry::destroy_room)
    /// or directly by embedders. Connected clients stop receiving events.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-connection outbound channels.
    senders: HashMap<ConnectionId, ConnectionSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    vote_timer: DeadlineTimer,
    sweep: SweepInterval,
    last_activity: Instant,
}

impl RoomActor {
    /// Runs the actor loop until shutdown, expiry, or every handle is gone.
    async fn run(mut self) {
        let code = self.room.code().clone();
        tracing::info!(room = %code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                fired = self.vote_timer.wait() => {
                    let out = self.room.resolve_vote(fired.epoch);
                    self.dispatch(out);
                }
                _ = self.sweep.tick() => {
                    if self.is_expired() {
                        tracing::info!(room = %code, "room idle, shutting down");
                        break;
                    }
                }
            }
        }

        tracing::info!(room = %code, "room actor stopped");
    }

    /// Handles one command. Returns `false` to stop the actor.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Event {
                conn,
                sender,
                event,
            } => {
                self.last_activity = Instant::now();
                self.senders.insert(conn, sender);
                self.handle_event(conn, event);
            }
            RoomCommand::Disconnected { conn } => {
                self.last_activity = Instant::now();
                self.senders.remove(&conn);
                self.room.disconnect(conn);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.room.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.room.code(), "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_event(&mut self, conn: ConnectionId, event: ClientEvent) {
        let kind = event.kind();
        let result = match event {
            ClientEvent::CreateRoom { .. } => Err(RoomError::InvalidState(
                "rooms are created outside a room".into(),
            )),
            ClientEvent::StartGame { .. } => self.room.start_game(conn),
            ClientEvent::DrawNumber { .. } => self.room.draw(conn),
            ClientEvent::StartVote { .. } => self.room.start_vote(conn).map(|(epoch, out)| {
                self.vote_timer.arm(epoch, self.room.config().vote_duration);
                out
            }),
            ClientEvent::SubmitVote {
                letter, client_id, ..
            } => self.room.submit_vote(conn, &client_id, letter),
            ClientEvent::JoinRoom {
                name, client_id, ..
            } => self.room.join(conn, &name, &client_id),
            ClientEvent::Reconnect { client_id, .. } => self.room.reconnect(conn, &client_id),
            ClientEvent::MarkNumber {
                number,
                client_id,
                is_marking,
                ..
            } => self.room.mark(conn, &client_id, number, is_marking),
            ClientEvent::ClaimBingo { client_id, .. } => self.room.claim(conn, &client_id),
            ClientEvent::SendChat {
                client_id, text, ..
            } => self.room.chat(conn, &client_id, &text, Instant::now()),
            ClientEvent::BanPlayer {
                client_id,
                target_client_id,
                ..
            } => self.room.ban(conn, &client_id, &target_client_id),
        };

        match result {
            Ok(out) => self.dispatch(out),
            Err(err) => {
                tracing::debug!(
                    room = %self.room.code(),
                    %conn,
                    event = kind,
                    error = %err,
                    "request rejected"
                );
                if let Some(notice) = err.notice() {
                    self.send_to(conn, notice);
                }
            }
        }
    }

    /// Fans events out to the connections behind each recipient.
    fn dispatch(&mut self, out: Outbox) {
        for (recipient, event) in out {
            for conn in self.room.resolve(recipient) {
                self.send_to(conn, event.clone());
            }
        }
    }

    /// Sends to one connection. Drops the sender if its writer is gone.
    fn send_to(&mut self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            if sender.send(event).is_err() {
                self.senders.remove(&conn);
            }
        }
    }

    fn is_expired(&self) -> bool {
        let ttl = self.room.config().idle_ttl;
        !ttl.is_zero() && !self.room.any_connected() && self.last_activity.elapsed() >= ttl
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// `host_sender` reaches the host's connection from the start, before the
/// host has sent anything to the room.
pub(crate) fn spawn_room(
    room: Room,
    host_conn: ConnectionId,
    host_sender: ConnectionSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code().clone();
    let sweep = SweepInterval::new(room.config().sweep_period());

    let actor = RoomActor {
        room,
        senders: HashMap::from([(host_conn, host_sender)]),
        receiver: rx,
        vote_timer: DeadlineTimer::new(),
        sweep,
        last_activity: Instant::now(),
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
