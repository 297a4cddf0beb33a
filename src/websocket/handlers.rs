use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Message;
use crate::state::AppState;
use crate::websocket::events::WsOutboundEvent;
use crate::websocket::message_types::WsInboundEvent;

#[derive(Deserialize)]
pub struct WsParams {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
}

/// GET /api/v1/ws?conversation_id=&user_id=
///
/// One socket per open conversation view. The server pushes full snapshots
/// (message log, typing flag); the client sends typing signals and read
/// acknowledgements.
pub async fn conversation_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_conversation(socket, state, params))
}

async fn handle_conversation(socket: WebSocket, state: AppState, params: WsParams) {
    let WsParams {
        conversation_id,
        user_id,
    } = params;

    match state.conversations.is_participant(conversation_id, user_id).await {
        Ok(true) => {}
        _ => {
            debug!(%conversation_id, %user_id, "ws rejected: not a participant");
            let mut socket = socket;
            let _ = socket.send(WsMessage::Close(None)).await;
            return;
        }
    }

    let mut messages = match state.fanout.subscribe_messages(conversation_id).await {
        Ok(q) => q,
        Err(e) => {
            warn!(error = %e, %conversation_id, "ws message subscription failed");
            return;
        }
    };
    let mut typing = match state.presence.subscribe_typing(conversation_id, user_id).await {
        Ok(q) => q,
        Err(e) => {
            warn!(error = %e, %conversation_id, "ws typing subscription failed");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();

    // Initial snapshots so the client renders without waiting for a change.
    let snapshot = messages.current();
    mark_batch_delivered(&state, &snapshot, user_id).await;
    if send_event(
        &mut sink,
        WsOutboundEvent::MessageList { messages: snapshot },
        user_id,
        Some(conversation_id),
    )
    .await
    .is_err()
    {
        return;
    }
    let _ = send_event(
        &mut sink,
        WsOutboundEvent::TypingChanged {
            typing: typing.current(),
        },
        user_id,
        Some(conversation_id),
    )
    .await;

    loop {
        tokio::select! {
            snapshot = messages.changed() => {
                let Some(snapshot) = snapshot else { break };
                mark_batch_delivered(&state, &snapshot, user_id).await;
                let event = WsOutboundEvent::MessageList { messages: snapshot };
                if send_event(&mut sink, event, user_id, Some(conversation_id)).await.is_err() {
                    break;
                }
            }
            flag = typing.changed() => {
                let Some(flag) = flag else { break };
                let event = WsOutboundEvent::TypingChanged { typing: flag };
                if send_event(&mut sink, event, user_id, Some(conversation_id)).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_client_frame(&state, conversation_id, user_id, &text).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, %conversation_id, "ws receive error");
                        break;
                    }
                }
            }
        }
    }

    // A closed socket means nobody is typing on it anymore.
    if let Err(e) = state.presence.set_typing(conversation_id, user_id, false).await {
        debug!(error = %e, %conversation_id, "failed to clear typing on disconnect");
    }
    messages.cancel();
    typing.cancel();
    debug!(%conversation_id, %user_id, "ws closed");
}

async fn handle_client_frame(state: &AppState, conversation_id: Uuid, user_id: Uuid, text: &str) {
    let event: WsInboundEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "ignoring malformed ws frame");
            return;
        }
    };
    let result = match event {
        WsInboundEvent::Typing { is_typing } => {
            state
                .presence
                .set_typing(conversation_id, user_id, is_typing)
                .await
        }
        WsInboundEvent::Read => state.conversations.mark_read(conversation_id, user_id).await,
    };
    if let Err(e) = result {
        debug!(error = %e, %conversation_id, "ws frame handling failed");
    }
}

/// Delivery receipts piggyback on snapshot delivery: pushing a message down
/// this socket is what "delivered" means.
async fn mark_batch_delivered(state: &AppState, messages: &[Message], user_id: Uuid) {
    for message in messages {
        if message.delivered_to.contains(&user_id) {
            continue;
        }
        if let Err(e) = state.receipts.mark_delivered(message.id, user_id).await {
            debug!(error = %e, message_id = %message.id, "delivery mark failed");
        }
    }
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    event: WsOutboundEvent,
    user_id: Uuid,
    conversation_id: Option<Uuid>,
) -> Result<(), ()> {
    let payload = match event.to_payload(user_id, conversation_id) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "ws payload serialization failed");
            return Err(());
        }
    };
    sink.send(WsMessage::Text(payload)).await.map_err(|_| ())
}

#[derive(Deserialize)]
pub struct WsListParams {
    pub user_id: Uuid,
}

/// GET /api/v1/ws/conversations?user_id=
///
/// Pushes the user's conversation list whenever any conversation changes;
/// inbound frames are ignored.
pub async fn conversation_list_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<WsListParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_conversation_list(socket, state, params.user_id))
}

async fn handle_conversation_list(socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut conversations = match state.fanout.subscribe_conversations(user_id).await {
        Ok(q) => q,
        Err(e) => {
            warn!(error = %e, %user_id, "ws conversation subscription failed");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();
    let initial = WsOutboundEvent::ConversationList {
        conversations: conversations.current(),
    };
    if send_event(&mut sink, initial, user_id, None).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            snapshot = conversations.changed() => {
                let Some(snapshot) = snapshot else { break };
                let event = WsOutboundEvent::ConversationList { conversations: snapshot };
                if send_event(&mut sink, event, user_id, None).await.is_err() {
                    break;
                }
            }
            closed = wait_for_close(&mut stream) => {
                if closed {
                    break;
                }
            }
        }
    }

    conversations.cancel();
    debug!(%user_id, "conversation list ws closed");
}

async fn wait_for_close(stream: &mut SplitStream<WebSocket>) -> bool {
    match stream.next().await {
        Some(Ok(WsMessage::Close(_))) | None => true,
        Some(Ok(_)) => false,
        Some(Err(_)) => true,
    }
}
