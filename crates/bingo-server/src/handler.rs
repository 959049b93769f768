//! Per-connection handler: frame decoding and routing to room actors.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Split the socket; a writer task drains this connection's outbox
//!   2. Loop: receive frames → decode → create a room or forward to one
//!   3. On close, tell every room this connection touched

use std::collections::HashMap;
use std::sync::Arc;

use bingo_protocol::{ClientEvent, Codec, ConnectionId, RoomCode, ServerEvent};
use bingo_room::{ConnectionSender, RoomError, RoomHandle};
use bingo_session::Authenticator;
use bingo_transport::{
    Connection, FrameReceiver, FrameSender, WebSocketConnection, WebSocketReceiver,
};
use tokio::sync::mpsc;

use crate::BingoError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), BingoError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer(), "handling new connection");

    let (mut sink, mut stream) = conn.split();
    let (outbox, mut pending) = mpsc::unbounded_channel::<ServerEvent>();

    let writer_state = Arc::clone(&state);
    let writer = tokio::spawn(async move {
        while let Some(event) = pending.recv().await {
            let text = match writer_state.codec.encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = sink.send_text(text).await {
                tracing::warn!(%conn_id, error = %e, "send failed, dropping writer");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut touched: HashMap<RoomCode, RoomHandle> = HashMap::new();
    let result = read_loop(conn_id, &mut stream, &state, &outbox, &mut touched).await;

    for (code, handle) in touched {
        if let Err(e) = handle.disconnect(conn_id).await {
            tracing::debug!(%conn_id, room = %code, error = %e, "room gone before disconnect");
        }
    }

    // The peer is gone; anything still queued has nowhere to go.
    drop(outbox);
    writer.abort();

    result
}

/// Receives frames until the peer closes or the socket fails.
async fn read_loop<A, C>(
    conn_id: ConnectionId,
    stream: &mut WebSocketReceiver,
    state: &Arc<ServerState<A, C>>,
    outbox: &ConnectionSender,
    touched: &mut HashMap<RoomCode, RoomHandle>,
) -> Result<(), BingoError>
where
    A: Authenticator,
    C: Codec,
{
    loop {
        let frame = match stream.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let event = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                let _ = outbox.send(ServerEvent::ErrorMessage {
                    text: format!("invalid message: {e}"),
                });
                continue;
            }
        };

        if let Err(err) = route(conn_id, event, state, outbox, touched).await {
            tracing::debug!(%conn_id, error = %err, "request rejected");
            if let Some(notice) = err.notice() {
                let _ = outbox.send(notice);
            }
        }
    }
}

/// Sends one decoded event where it belongs.
async fn route<A, C>(
    conn_id: ConnectionId,
    event: ClientEvent,
    state: &Arc<ServerState<A, C>>,
    outbox: &ConnectionSender,
    touched: &mut HashMap<RoomCode, RoomHandle>,
) -> Result<(), RoomError>
where
    A: Authenticator,
    C: Codec,
{
    let code = match &event {
        ClientEvent::CreateRoom {
            credential,
            client_id,
        } => {
            let mut rooms = state.rooms.lock().await;
            let code = rooms
                .create_room(credential, client_id.clone(), conn_id, outbox.clone())
                .await?;
            let handle = rooms.get(&code)?;
            touched.insert(code, handle);
            return Ok(());
        }
        other => match other.room_code() {
            Some(code) => code.clone(),
            None => return Err(RoomError::InvalidState("event names no room".into())),
        },
    };

    let handle = match touched.get(&code) {
        Some(handle) if !handle.is_closed() => handle.clone(),
        _ => {
            touched.remove(&code);
            state.rooms.lock().await.get(&code)?
        }
    };

    handle.send_event(conn_id, outbox.clone(), event).await?;
    touched.insert(code, handle);
    Ok(())
}
