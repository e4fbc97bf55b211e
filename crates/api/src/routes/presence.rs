use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use doorsign_db::models::{CustomSlot, MemberRole, PresenceStatus, StatusTag};
use doorsign_services::dao::presence::CustomSlotId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub user_id: String,
    pub status: StatusTag,
    pub custom1: CustomSlot,
    pub custom2: CustomSlot,
    pub updated_at: i64,
}

impl From<PresenceStatus> for PresenceResponse {
    fn from(p: PresenceStatus) -> Self {
        Self {
            user_id: p.user_id.to_hex(),
            status: p.status,
            custom1: p.custom1,
            custom2: p.custom2,
            updated_at: p.updated_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: StatusTag,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomSlotRequest {
    #[validate(length(min = 1, max = 32))]
    pub label: String,
    #[validate(length(min = 1, max = 32))]
    pub icon: String,
}

#[derive(Debug, Serialize)]
pub struct TeamMemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_color: String,
    pub role: MemberRole,
    pub status: StatusTag,
    pub custom1: CustomSlot,
    pub custom2: CustomSlot,
    pub updated_at: i64,
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PresenceResponse>, ApiError> {
    let status = state.presence.get(auth.user_id).await?;
    Ok(Json(status.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SetStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state.presence.set_status(auth.user_id, body.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_custom_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slot): Path<u8>,
    Json(body): Json<CustomSlotRequest>,
) -> Result<StatusCode, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let slot = match slot {
        1 => CustomSlotId::One,
        2 => CustomSlotId::Two,
        _ => return Err(ApiError::BadRequest("Slot must be 1 or 2".to_string())),
    };

    state
        .presence
        .set_custom_slot(auth.user_id, slot, body.label, body.icon)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Statuses of everyone in the caller's active org, the board teammates
/// actually look at.
pub async fn team(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TeamMemberResponse>>, ApiError> {
    let active = state
        .orgs
        .active_membership(auth.user_id)
        .await?
        .ok_or(ApiError::Forbidden(
            "No active organization".to_string(),
        ))?;

    let memberships = state.orgs.list_members(active.org_id).await?;
    let user_ids: Vec<ObjectId> = memberships.iter().map(|m| m.user_id).collect();
    let users = state.users.find_by_ids(&user_ids).await?;
    let statuses = state.presence.for_users(&user_ids).await?;

    let response = memberships
        .into_iter()
        .filter_map(|m| {
            let user = users.iter().find(|u| u.id == Some(m.user_id))?;
            let status = statuses.iter().find(|s| s.user_id == m.user_id)?;
            Some(TeamMemberResponse {
                user_id: m.user_id.to_hex(),
                display_name: user.display_name.clone(),
                avatar_color: user.avatar_color.clone(),
                role: m.role,
                status: status.status,
                custom1: status.custom1.clone(),
                custom2: status.custom2.clone(),
                updated_at: status.updated_at.timestamp_millis(),
            })
        })
        .collect();

    Ok(Json(response))
}
