use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use doorsign_db::models::{MemberRole, OrgKind, Plan};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrgRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub kind: OrgKind,
}

#[derive(Debug, Serialize)]
pub struct OrgResponse {
    pub id: String,
    pub name: String,
    pub kind: OrgKind,
    pub plan: Plan,
    pub reset_hour: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub org: OrgResponse,
    pub role: MemberRole,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_color: String,
    pub role: MemberRole,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub new_admin_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub reset_hour: u8,
}

#[derive(Debug, Serialize)]
pub struct InviteLinkResponse {
    pub code: String,
    pub url: String,
}

fn parse_org_id(org_id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(org_id).map_err(|_| ApiError::BadRequest("Invalid org_id".to_string()))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MembershipResponse>>, ApiError> {
    let memberships = state.orgs.list_memberships(auth.user_id).await?;

    let response = memberships
        .into_iter()
        .map(|view| MembershipResponse {
            org: OrgResponse {
                id: view.membership.org_id.to_hex(),
                name: view.org.name,
                kind: view.org.kind,
                plan: view.org.plan,
                reset_hour: view.org.reset_hour,
                invite_code: view.org.invite_code,
            },
            role: view.membership.role,
            is_active: view.membership.is_active,
        })
        .collect();

    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateOrgRequest>,
) -> Result<(StatusCode, Json<OrgResponse>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let org = state
        .orgs
        .create(auth.user_id, body.name, body.kind, &state.quota)
        .await?;

    // First-membership path for users registered before presence seeding
    // existed; a no-op otherwise.
    state.presence.ensure(auth.user_id).await?;

    let org_id = org
        .id
        .ok_or_else(|| ApiError::Internal("Organization created without an id".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(OrgResponse {
            id: org_id.to_hex(),
            name: org.name,
            kind: org.kind,
            plan: org.plan,
            reset_hour: org.reset_hour,
            invite_code: org.invite_code,
        }),
    ))
}

pub async fn switch_active(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    state.orgs.switch_active(auth.user_id, org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    state.orgs.leave(auth.user_id, org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
    Json(body): Json<TransferRequest>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    let new_admin_id = ObjectId::parse_str(&body.new_admin_id)
        .map_err(|_| ApiError::BadRequest("Invalid new_admin_id".to_string()))?;

    state
        .orgs
        .transfer_admin(auth.user_id, org_id, new_admin_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dissolve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    state.orgs.dissolve(auth.user_id, org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    state
        .orgs
        .update_reset_hour(auth.user_id, org_id, body.reset_hour)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite_link(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<Json<InviteLinkResponse>, ApiError> {
    let org_id = parse_org_id(&org_id)?;
    let link = state
        .invites
        .get_or_create_link(auth.user_id, org_id, &state.settings.app.base_url)
        .await?;

    Ok(Json(InviteLinkResponse {
        code: link.code,
        url: link.url,
    }))
}

pub async fn members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let org_id = parse_org_id(&org_id)?;

    state
        .orgs
        .find_membership(org_id, auth.user_id)
        .await?
        .ok_or(ApiError::Forbidden(
            "Not a member of this organization".to_string(),
        ))?;

    let memberships = state.orgs.list_members(org_id).await?;
    let user_ids: Vec<ObjectId> = memberships.iter().map(|m| m.user_id).collect();
    let users = state.users.find_by_ids(&user_ids).await?;

    let response = memberships
        .into_iter()
        .filter_map(|m| {
            users
                .iter()
                .find(|u| u.id == Some(m.user_id))
                .map(|u| MemberResponse {
                    user_id: m.user_id.to_hex(),
                    display_name: u.display_name.clone(),
                    avatar_color: u.avatar_color.clone(),
                    role: m.role,
                    is_active: m.is_active,
                })
        })
        .collect();

    Ok(Json(response))
}
