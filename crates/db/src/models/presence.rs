use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// One row per user, shared across all of the user's organizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceStatus {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub status: StatusTag,
    #[serde(default)]
    pub custom1: CustomSlot,
    #[serde(default)]
    pub custom2: CustomSlot,
    pub updated_at: DateTime,
}

/// Eight fixed presets plus the two user-editable slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusTag {
    #[default]
    Available,
    Focus,
    Busy,
    Meeting,
    Lunch,
    Commuting,
    Away,
    DoNotDisturb,
    Custom1,
    Custom2,
}

impl StatusTag {
    pub fn is_custom(&self) -> bool {
        matches!(self, StatusTag::Custom1 | StatusTag::Custom2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSlot {
    pub label: String,
    pub icon: String,
}

impl Default for CustomSlot {
    fn default() -> Self {
        Self {
            label: "Custom".to_string(),
            icon: "label".to_string(),
        }
    }
}

impl PresenceStatus {
    pub const COLLECTION: &'static str = "presence_statuses";
}
