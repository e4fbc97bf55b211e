use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// The (user, organization) relation. Unique on (org_id, user_id); a
/// partial-unique index on user_id filtered to `is_active: true` backs the
/// one-active-org-per-user invariant at the store level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub user_id: ObjectId,
    pub role: MemberRole,
    pub is_active: bool,
    pub joined_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl Membership {
    pub const COLLECTION: &'static str = "memberships";
}
