use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub org_id: String,
    pub org_name: String,
}

pub async fn redeem(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    let org = state
        .invites
        .redeem(auth.user_id, &code, &state.quota)
        .await?;

    // Joining may be the user's first membership.
    state.presence.ensure(auth.user_id).await?;

    let org_id = org
        .id
        .ok_or_else(|| ApiError::Internal("Organization row without an id".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(RedeemResponse {
            org_id: org_id.to_hex(),
            org_name: org.name,
        }),
    ))
}
