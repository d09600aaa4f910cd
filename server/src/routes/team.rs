use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use dentflow::models::{Clinic, NewClinic, NewTeamMember, TeamMember};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedMember {
    pub member: TeamMember,
    pub chats_notified: usize,
}

pub async fn create_clinic(
    State(state): State<AppState>,
    Json(input): Json<NewClinic>,
) -> ApiResult<(StatusCode, Json<Clinic>)> {
    let clinic = state.run(move |s| s.directory.create_clinic(input)).await?;
    Ok((StatusCode::CREATED, Json(clinic)))
}

pub async fn get_clinic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Clinic>> {
    Ok(Json(state.run(move |s| s.directory.get_clinic(&id)).await?))
}

pub async fn create_team_member(
    State(state): State<AppState>,
    Json(input): Json<NewTeamMember>,
) -> ApiResult<(StatusCode, Json<TeamMember>)> {
    let member = state
        .run(move |s| s.directory.create_team_member(input))
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Deletes a team member after announcing their removal from each chat
/// that lists them.
pub async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RemovedMember>> {
    let (member, chats_notified) = state
        .run(move |s| s.fanout.remove_team_member(&id))
        .await?;
    Ok(Json(RemovedMember {
        member,
        chats_notified,
    }))
}
