use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use dentflow::models::{Chat, ChatSummary, Message, NewMessage};
use dentflow::ParticipantDiff;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub chat_id: String,
    pub unread_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsRequest {
    pub participants: Vec<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub chat: Chat,
    #[serde(flatten)]
    pub diff: ParticipantDiff,
}

/// Chats of a clinic. With `?userId=`, only that user's chats, each with
/// its unread count.
pub async fn clinic_chats(
    State(state): State<AppState>,
    Path(clinic_id): Path<String>,
    Query(query): Query<ChatListQuery>,
) -> ApiResult<Json<Vec<ChatSummary>>> {
    let summaries = state
        .run(move |s| {
            s.unread
                .summaries_for_clinic(&clinic_id, query.user_id.as_deref())
        })
        .await?;
    Ok(Json(summaries))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.run(move |s| s.chats.messages(&chat_id)).await?))
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(input): Json<NewMessage>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = state
        .run(move |s| s.fanout.send_message(&chat_id, input))
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    let id = chat_id.clone();
    let unread_count = state
        .run(move |s| s.fanout.mark_read(&id, &request.user_id))
        .await?;
    Ok(Json(MarkReadResponse {
        chat_id,
        unread_count,
    }))
}

pub async fn set_participants(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(request): Json<ParticipantsRequest>,
) -> ApiResult<Json<ParticipantsResponse>> {
    let (chat, diff) = state
        .run(move |s| {
            s.fanout.set_participants(
                &chat_id,
                &request.participants,
                request.updated_by.as_deref(),
            )
        })
        .await?;
    Ok(Json(ParticipantsResponse { chat, diff }))
}

pub async fn archive_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Chat>> {
    Ok(Json(state.run(move |s| s.chats.archive(&chat_id)).await?))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.run(move |s| s.chats.delete(&chat_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use dentflow::models::{NewClinic, NewOrder, OrderStatus, StatusChange};
    use dentflow::{ServerEvent, Services};

    use crate::routes::test_support::{app, call};

    /// Clinic "Clinic A" with one activated order whose chat includes Dr. Smith.
    fn seeded(services: &Services) -> (String, String) {
        let clinic = services
            .directory
            .create_clinic(NewClinic {
                first_name: "Clinic".into(),
                last_name: "A".into(),
                ..Default::default()
            })
            .unwrap();
        services
            .directory
            .create_team_member(dentflow::models::NewTeamMember {
                full_name: "Dr. Smith".into(),
                role: "qa".into(),
                email: None,
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
        (clinic.id, chat.id)
    }

    #[tokio::test]
    async fn test_post_message_and_unread_listing() {
        let (app, services) = app();
        let (clinic_id, chat_id) = seeded(&services);

        let (connection, mut events) = services.hub().connect();
        services.hub().register_user(connection, "Dr. Smith");

        let (status, message) = call(
            &app,
            Method::POST,
            &format!("/chats/{}/messages", chat_id),
            Some(json!({"sender": "Clinic A", "content": "shade A2?"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message["readBy"], json!(["Clinic A"]));
        assert_eq!(events.try_recv().unwrap(), ServerEvent::unread(&chat_id, 1));

        let (_, listed) = call(
            &app,
            Method::GET,
            &format!("/chats/{}?userId=Dr.%20Smith", clinic_id),
            None,
        )
        .await;
        assert_eq!(listed[0]["id"], chat_id.as_str());
        assert_eq!(listed[0]["unreadCount"], 1);

        let (_, outsider) = call(
            &app,
            Method::GET,
            &format!("/chats/{}?userId=Dr.%20Who", clinic_id),
            None,
        )
        .await;
        assert_eq!(outsider, json!([]));

        let (status, read) = call(
            &app,
            Method::POST,
            &format!("/chats/{}/mark-read", chat_id),
            Some(json!({"userId": "Dr. Smith"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["unreadCount"], 0);
        assert_eq!(events.try_recv().unwrap(), ServerEvent::unread(&chat_id, 0));
    }

    #[tokio::test]
    async fn test_participants_patch_returns_diff() {
        let (app, services) = app();
        let (_, chat_id) = seeded(&services);

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/chats/{}/participants", chat_id),
            Some(json!({"participants": ["Clinic A", "Dr. Jones"], "updatedBy": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["added"], json!(["Dr. Jones"]));
        assert_eq!(body["removed"], json!(["Dr. Smith"]));
        assert_eq!(body["chat"]["participants"], json!(["Clinic A", "Dr. Jones"]));
    }

    #[tokio::test]
    async fn test_archive_then_delete() {
        let (app, services) = app();
        let (_, chat_id) = seeded(&services);
        call(
            &app,
            Method::POST,
            &format!("/chats/{}/messages", chat_id),
            Some(json!({"sender": "Clinic A", "content": "hello"})),
        )
        .await;

        let (status, archived) =
            call(&app, Method::POST, &format!("/chats/{}/archive", chat_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(archived["isActive"], false);
        let (_, messages) =
            call(&app, Method::GET, &format!("/chats/{}/messages", chat_id), None).await;
        assert_eq!(messages.as_array().map(Vec::len), Some(1));

        let (status, _) = call(&app, Method::DELETE, &format!("/chats/{}", chat_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body): (StatusCode, Value) =
            call(&app, Method::GET, &format!("/chats/{}/messages", chat_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_blank_sender_is_bad_request() {
        let (app, services) = app();
        let (_, chat_id) = seeded(&services);
        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/chats/{}/messages", chat_id),
            Some(json!({"sender": " ", "content": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
