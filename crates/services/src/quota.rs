use bson::{doc, oid::ObjectId};
use doorsign_config::QuotaSettings;
use doorsign_db::models::Membership;
use mongodb::Database;

use crate::dao::base::{BaseDao, DaoResult};

/// Advisory limits consulted before membership-creating mutations. No lock
/// is held between check and write, so a race window can transiently exceed
/// a limit; the quotas are soft by contract.
pub struct QuotaGuard {
    members: BaseDao<Membership>,
    limits: QuotaSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub count: u64,
    pub limit: u64,
}

impl QuotaGuard {
    pub fn new(db: &Database, limits: QuotaSettings) -> Self {
        Self {
            members: BaseDao::new(db, Membership::COLLECTION),
            limits,
        }
    }

    /// Allowed iff the org's member count is below the seat limit.
    pub async fn check_member_limit(&self, org_id: ObjectId) -> DaoResult<QuotaCheck> {
        let count = self.members.count(doc! { "org_id": org_id }).await?;
        Ok(QuotaCheck {
            allowed: within(count, self.limits.max_members_per_org),
            count,
            limit: self.limits.max_members_per_org,
        })
    }

    /// Allowed iff the user's distinct-organization count is below the limit.
    /// One membership row per (user, org), so the row count is the org count.
    pub async fn check_org_limit(&self, user_id: ObjectId) -> DaoResult<QuotaCheck> {
        let count = self.members.count(doc! { "user_id": user_id }).await?;
        Ok(QuotaCheck {
            allowed: within(count, self.limits.max_orgs_per_user),
            count,
            limit: self.limits.max_orgs_per_user,
        })
    }
}

fn within(count: u64, limit: u64) -> bool {
    count < limit
}
