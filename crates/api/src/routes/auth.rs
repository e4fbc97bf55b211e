use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use doorsign_db::models::OrgKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Optionally create a first organization in the same flow.
    pub org_name: Option<String>,
    pub org_kind: Option<OrgKind>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_color: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

fn auth_cookie(token: &str, max_age: u64) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        token, max_age
    );
    let cookie = cookie
        .parse()
        .map_err(|_| ApiError::Internal("Invalid cookie header".to_string()))?;
    headers.insert(header::SET_COOKIE, cookie);
    Ok(headers)
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(body.email.clone(), body.display_name.clone(), password_hash)
        .await?;

    let user_id = user.id.ok_or_else(|| {
        ApiError::Internal("User created without an id".to_string())
    })?;

    // Status row exists from the first moment the user can be seen by
    // teammates.
    state.presence.ensure(user_id).await?;

    if let Some(org_name) = body.org_name {
        let kind = body.org_kind.unwrap_or(OrgKind::Personal);
        state
            .orgs
            .create(user_id, org_name, kind, &state.quota)
            .await?;
    }

    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in)?;

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: UserResponse {
            id: user_id.to_hex(),
            email: user.email,
            display_name: user.display_name,
            avatar_color: user.avatar_color,
        },
    };

    Ok((StatusCode::CREATED, headers, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user = state
        .users
        .find_by_email(&body.email)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("No password set".to_string()))?;

    let valid = state.auth.verify_password(&body.password, password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("User row without an id".to_string()))?;
    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in)?;

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: UserResponse {
            id: user_id.to_hex(),
            email: user.email,
            display_name: user.display_name,
            avatar_color: user.avatar_color,
        },
    };

    Ok((headers, Json(response)))
}

pub async fn logout() -> Result<HeaderMap, ApiError> {
    auth_cookie("", 0)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.base.find_by_id(auth.user_id).await?;

    Ok(Json(UserResponse {
        id: auth.user_id.to_hex(),
        email: user.email,
        display_name: user.display_name,
        avatar_color: user.avatar_color,
    }))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .users
        .update_display_name(auth.user_id, body.display_name)
        .await?;

    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(UserResponse {
        id: auth.user_id.to_hex(),
        email: user.email,
        display_name: user.display_name,
        avatar_color: user.avatar_color,
    }))
}

/// Password changes require re-authentication with the current password.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = state.users.base.find_by_id(auth.user_id).await?;
    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("No password set".to_string()))?;

    let valid = state
        .auth
        .verify_password(&body.current_password, password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let new_hash = state.auth.hash_password(&body.new_password)?;
    state
        .users
        .update_password_hash(auth.user_id, new_hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID".to_string()))?;

    let user = state.users.base.find_by_id(user_id).await?;

    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in)?;

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: UserResponse {
            id: user_id.to_hex(),
            email: user.email,
            display_name: user.display_name,
            avatar_color: user.avatar_color,
        },
    };

    Ok((headers, Json(response)))
}
