use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// One row per (broadcast, recipient). The sender identity is snapshotted
/// so the row stays renderable after the sender leaves the org.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub sender_id: ObjectId,
    pub sender_name: String,
    pub sender_avatar_color: String,
    pub recipient_id: ObjectId,
    pub kind: NotificationKind,
    pub message: String,
    pub status: NotificationStatus,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime,
    pub expires_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Knock,
    Lunch,
    Meeting,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";

    /// Expiry is derived, never stored as a status.
    pub fn is_expired(&self, now: DateTime) -> bool {
        now > self.expires_at
    }

    pub fn is_actionable(&self, now: DateTime) -> bool {
        self.status == NotificationStatus::Pending && !self.is_expired(now)
    }
}
