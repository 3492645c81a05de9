//! Per-connection handler: event decoding, routing, and rejections.
//!
//! Each accepted connection runs this handler in its own task. Inbound
//! frames become [`ClientEvent`]s routed to the registry; outbound
//! [`ServerEvent`]s flow through an unbounded channel drained by a
//! writer task, so room broadcasts never wait on a slow socket and
//! rejections stay ordered with the broadcasts they follow.

use std::sync::Arc;

use tokio::sync::mpsc;

use parlor_protocol::{
    ClientEvent, Codec, ConnectionId, GameType, PeerId, RejectReason, RoomId,
    ServerEvent,
};
use parlor_room::{EventSender, RoomError};
use parlor_transport::{Connection, WsConnection};

use crate::server::GatewayState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(conn: WsConnection, state: Arc<GatewayState>) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: encode and push everything the rooms (and we)
    // produce for this client.
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let text = match codec.encode(&event) {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::error!(%error, "failed to encode server event");
                        continue;
                    }
                };
                if conn.send(&text).await.is_err() {
                    break;
                }
            }
        })
    };

    // The room/peer this connection is bound to after a successful
    // join. One room per connection.
    let mut membership: Option<(RoomId, PeerId)> = None;

    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed");
                break;
            }
            Err(error) => {
                tracing::debug!(%conn_id, %error, "receive error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "undecodable frame");
                reject(&events_tx, RejectReason::BadEvent, &error.to_string());
                continue;
            }
        };

        handle_event(&state, &events_tx, conn_id, &mut membership, event).await;
    }

    // Transport lost without an explicit leave-room: hand the peer to
    // the room's disconnect grace window instead of removing it — a
    // network blip shouldn't forfeit a game.
    if let Some((room_id, peer_id)) = membership {
        let _ = state
            .registry
            .drop_connection(&room_id, &peer_id, conn_id)
            .await;
    }

    writer.abort();
}

async fn handle_event(
    state: &Arc<GatewayState>,
    events_tx: &EventSender,
    conn_id: ConnectionId,
    membership: &mut Option<(RoomId, PeerId)>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom {
            room_id,
            peer_id,
            game_type,
        } => {
            let game_type: GameType = match game_type.parse() {
                Ok(game_type) => game_type,
                Err(error) => {
                    reject(
                        events_tx,
                        RejectReason::UnknownGameType,
                        &error.to_string(),
                    );
                    return;
                }
            };
            if let Some((bound_room, bound_peer)) = membership {
                // Re-joining the same seat is a harmless refresh;
                // anything else needs its own connection.
                if *bound_room != room_id || *bound_peer != peer_id {
                    reject(
                        events_tx,
                        RejectReason::AlreadyInRoom,
                        &format!("connection already bound to room {bound_room}"),
                    );
                    return;
                }
            }
            match state
                .registry
                .join(&room_id, &peer_id, conn_id, game_type, events_tx.clone())
                .await
            {
                Ok(()) => *membership = Some((room_id, peer_id)),
                Err(error) => reject_room(events_tx, &error),
            }
        }

        ClientEvent::PlayerReady { room_id, peer_id } => {
            if let Err(error) = state.registry.set_ready(&room_id, &peer_id).await {
                reject_room(events_tx, &error);
            }
        }

        ClientEvent::SubmitMove {
            room_id,
            peer_id,
            mv,
        } => {
            if let Err(error) = state.registry.apply_move(&room_id, &peer_id, mv).await {
                reject_room(events_tx, &error);
            }
        }

        ClientEvent::LeaveRoom { room_id, peer_id } => {
            match state.registry.leave(&room_id, &peer_id).await {
                Ok(()) => {
                    let left_bound_seat = membership
                        .as_ref()
                        .is_some_and(|(r, p)| *r == room_id && *p == peer_id);
                    if left_bound_seat {
                        *membership = None;
                    }
                }
                Err(error) => reject_room(events_tx, &error),
            }
        }
    }
}

/// Unicasts a rejection to this connection only. Other room members see
/// nothing for a refused action.
fn reject(events_tx: &EventSender, reason: RejectReason, detail: &str) {
    let _ = events_tx.send(ServerEvent::Rejected {
        reason,
        detail: detail.to_string(),
    });
}

fn reject_room(events_tx: &EventSender, error: &RoomError) {
    tracing::debug!(%error, "room operation rejected");
    reject(events_tx, error.reject_reason(), &error.to_string());
}
