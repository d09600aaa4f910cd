use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use dentflow::models::{Message, NewOrder, Order, StatusChange};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.run(move |s| s.orders.create_order(input)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.run(move |s| s.orders.get_order(&id)).await?))
}

pub async fn clinic_orders(
    State(state): State<AppState>,
    Path(clinic_id): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(
        state
            .run(move |s| s.orders.list_clinic_orders(&clinic_id))
            .await?,
    ))
}

/// Applies a status change and returns the updated order.
///
/// When the change provisioned or joined the order's chat, connected
/// clients are told about it.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Order>> {
    let order = state
        .run(move |s| {
            let outcome = s.orders.change_status(&id, &change)?;
            if let Some(provision) = &outcome.chat {
                if let Err(e) = s
                    .fanout
                    .announce_chat_update(provision, change.user_name.as_deref())
                {
                    log::warn!("Failed to announce chat {} update: {}", provision.chat.id, e);
                }
            }
            Ok(outcome.order)
        })
        .await?;
    Ok(Json(order))
}

pub async fn order_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state
        .run(move |s| {
            s.orders.get_order(&id)?;
            s.chats.order_messages(&id)
        })
        .await?;
    Ok(Json(messages))
}
