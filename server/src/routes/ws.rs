//! The socket protocol over a WebSocket.
//!
//! One task per socket multiplexes three sources: events addressed to this
//! connection, system-wide broadcasts, and frames from the client.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use dentflow::realtime::ConnectionId;
use dentflow::{ClientEvent, ServerEvent};

use crate::state::AppState;

pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let hub = state.services.hub().clone();
    let (connection, mut personal) = hub.connect();
    let mut system = hub.subscribe();
    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            Some(event) = personal.recv() => {
                if send(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            event = system.recv() => match event {
                Ok(event) => {
                    if send(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Socket {} missed {} broadcast event(s)", connection, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            frame = incoming.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = apply_frame(&state, connection, text).await {
                        if send(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.disconnect(connection);
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, event: &ServerEvent) -> Result<(), ()> {
    let text = match event.to_json() {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to encode '{}' event: {}", event.name(), e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await.map_err(|_| ())
}

/// Runs [`handle_frame`] on the blocking pool; sends touch the database.
async fn apply_frame(
    state: &AppState,
    connection: ConnectionId,
    text: String,
) -> Option<ServerEvent> {
    let state = state.clone();
    match tokio::task::spawn_blocking(move || handle_frame(&state, connection, &text)).await {
        Ok(reply) => reply,
        Err(e) => {
            log::error!("Frame handler for socket {} failed: {}", connection, e);
            Some(ServerEvent::error("internal error"))
        }
    }
}

/// Applies one client frame. Returns an event to send back to the client,
/// if any.
fn handle_frame(state: &AppState, connection: ConnectionId, text: &str) -> Option<ServerEvent> {
    let event = match ClientEvent::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            log::debug!("Socket {} sent an unreadable frame: {}", connection, e);
            return Some(ServerEvent::error(format!("invalid event: {}", e)));
        }
    };

    let services = &state.services;
    match event {
        ClientEvent::RegisterUser { user_id } => {
            if !services.hub().register_user(connection, &user_id) {
                return Some(ServerEvent::error("userId is required"));
            }
        }
        ClientEvent::JoinChat { chat_id } => services.hub().join_chat(connection, &chat_id),
        ClientEvent::LeaveChat { chat_id } => services.hub().leave_chat(connection, &chat_id),
        ClientEvent::SendMessage { chat_id, message } => {
            if let Err(e) = services.fanout.send_message(&chat_id, message) {
                log::warn!("Socket send to chat {} failed: {}", chat_id, e);
                return Some(ServerEvent::error(e.to_string()));
            }
        }
        ClientEvent::Typing(typing) => services.fanout.relay_typing(connection, typing),
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::app;
    use dentflow::models::{NewClinic, NewOrder, OrderStatus, StatusChange};

    #[tokio::test]
    async fn test_frames_drive_presence_and_sends() {
        let (_, services) = app();
        let state = AppState::new(services.clone());
        let clinic = services
            .directory
            .create_clinic(NewClinic {
                first_name: "Clinic".into(),
                last_name: "A".into(),
                ..Default::default()
            })
            .unwrap();
        let order = services
            .orders
            .create_order(NewOrder {
                clinic_id: clinic.id.clone(),
                ..Default::default()
            })
            .unwrap();
        let chat = services
            .orders
            .change_status(&order.id, &StatusChange::to(OrderStatus::Active).user("Dr. Smith"))
            .unwrap()
            .chat
            .unwrap()
            .chat;

        let hub = services.hub();
        let (viewer, mut viewer_rx) = hub.connect();
        let register = r#"{"event":"register-user","data":{"userId":"Dr. Smith"}}"#;
        assert!(handle_frame(&state, viewer, register).is_none());
        let join = format!(r#"{{"event":"join-chat","data":{{"chatId":"{}"}}}}"#, chat.id);
        assert!(handle_frame(&state, viewer, &join).is_none());
        assert!(hub.is_viewing(&chat.id, "Dr. Smith"));

        let (clinic_conn, _clinic_rx) = hub.connect();
        let send_frame = serde_json::json!({
            "event": "send-message",
            "data": {
                "chatId": chat.id,
                "message": {"sender": "Clinic A", "content": "ready?"}
            }
        })
        .to_string();
        assert!(handle_frame(&state, clinic_conn, &send_frame).is_none());
        assert!(matches!(
            viewer_rx.try_recv(),
            Ok(ServerEvent::NewMessage(m)) if m.content == "ready?"
        ));
        assert!(viewer_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frames_applied_off_the_reactor() {
        let (_, services) = app();
        let state = AppState::new(services.clone());
        let (conn, _rx) = services.hub().connect();

        let register = r#"{"event":"register-user","data":{"userId":"Dr. Smith"}}"#;
        assert!(apply_frame(&state, conn, register.to_string()).await.is_none());
        assert!(services.hub().is_registered("Dr. Smith"));
        assert!(matches!(
            apply_frame(&state, conn, "{".to_string()).await,
            Some(ServerEvent::Error { .. })
        ));
    }

    #[tokio::test]
    async fn test_bad_frames_get_error_replies() {
        let (_, services) = app();
        let state = AppState::new(services.clone());
        let (conn, _rx) = services.hub().connect();

        assert!(matches!(
            handle_frame(&state, conn, "not json"),
            Some(ServerEvent::Error { .. })
        ));
        assert!(matches!(
            handle_frame(&state, conn, r#"{"event":"register-user","data":{"userId":" "}}"#),
            Some(ServerEvent::Error { .. })
        ));
        let send_missing = serde_json::json!({
            "event": "send-message",
            "data": {"chatId": "nope", "message": {"sender": "a", "content": "b"}}
        })
        .to_string();
        assert!(matches!(
            handle_frame(&state, conn, &send_missing),
            Some(ServerEvent::Error { message }) if message.contains("nope")
        ));
    }
}
