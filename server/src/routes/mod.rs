//! HTTP routes.

mod chats;
mod orders;
mod team;
mod ws;

use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/orders/:id/messages", get(orders::order_messages))
        .route("/clinics", post(team::create_clinic))
        .route("/clinics/:id", get(team::get_clinic))
        .route("/clinics/:id/orders", get(orders::clinic_orders))
        // `:id` is the clinic for GET and the chat for DELETE.
        .route(
            "/chats/:id",
            get(chats::clinic_chats).delete(chats::delete_chat),
        )
        .route(
            "/chats/:id/messages",
            get(chats::list_messages).post(chats::post_message),
        )
        .route("/chats/:id/mark-read", post(chats::mark_read))
        .route("/chats/:id/participants", patch(chats::set_participants))
        .route("/chats/:id/archive", post(chats::archive_chat))
        .route("/team-member", post(team::create_team_member))
        .route("/team-member/:id", delete(team::delete_team_member))
        .route("/ws", get(ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
