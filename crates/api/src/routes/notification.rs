use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use doorsign_db::models::{Notification, NotificationKind, NotificationStatus};
use doorsign_services::dao::base::PaginationParams;
use doorsign_services::dao::notification::ReplyOutcome;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    pub kind: NotificationKind,
    #[validate(length(max = 280))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub outcome: ReplyOutcome,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub org_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar_color: String,
    pub kind: NotificationKind,
    pub message: String,
    pub status: NotificationStatus,
    pub is_read: bool,
    pub is_expired: bool,
    pub created_at: i64,
    pub expires_at: i64,
}

impl NotificationResponse {
    fn from_model(n: Notification, now: bson::DateTime) -> Option<Self> {
        let id = n.id?;
        Some(Self {
            id: id.to_hex(),
            org_id: n.org_id.to_hex(),
            sender_id: n.sender_id.to_hex(),
            sender_name: n.sender_name.clone(),
            sender_avatar_color: n.sender_avatar_color.clone(),
            kind: n.kind,
            message: n.message.clone(),
            status: n.status,
            is_read: n.is_read,
            is_expired: n.is_expired(now),
            created_at: n.created_at.timestamp_millis(),
            expires_at: n.expires_at.timestamp_millis(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<NotificationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

pub async fn broadcast(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<BroadcastResponse>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let receipt = state
        .notifications
        .broadcast(auth.user_id, body.kind, body.message)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BroadcastResponse {
            count: receipt.delivered,
        }),
    ))
}

pub async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = state.notifications.list_pending(auth.user_id).await?;

    let now = bson::DateTime::now();
    let response = notifications
        .into_iter()
        .filter_map(|n| NotificationResponse::from_model(n, now))
        .collect();

    Ok(Json(response))
}

pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let page = state
        .notifications
        .list_history(auth.user_id, &params)
        .await?;

    let now = bson::DateTime::now();
    Ok(Json(HistoryResponse {
        items: page
            .items
            .into_iter()
            .filter_map(|n| NotificationResponse::from_model(n, now))
            .collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        total_pages: page.total_pages,
    }))
}

pub async fn reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification_id = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification id".to_string()))?;

    let updated = state
        .notifications
        .reply(auth.user_id, notification_id, body.outcome)
        .await?;

    let now = bson::DateTime::now();
    NotificationResponse::from_model(updated, now)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Notification row without an id".to_string()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let notification_id = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification id".to_string()))?;

    state
        .notifications
        .mark_read(auth.user_id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
