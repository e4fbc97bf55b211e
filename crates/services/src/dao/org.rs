use bson::{DateTime, doc, oid::ObjectId};
use doorsign_db::models::{MemberRole, Membership, Notification, OrgKind, Organization, Plan};
use mongodb::Database;
use tracing::{error, warn};

use super::base::{BaseDao, DaoError, DaoResult};
use super::invite::generate_code;
use crate::quota::QuotaGuard;

/// Membership ledger: owns the org/user/role/active relation and its two
/// invariants (single active membership per user, at least one admin per
/// org). The partial-unique index on active memberships is the store-level
/// backstop; everything here funnels writes through it.
pub struct OrgDao {
    pub base: BaseDao<Organization>,
    pub members: BaseDao<Membership>,
    notifications: BaseDao<Notification>,
    code_retry_max: u32,
}

#[derive(Debug, Clone)]
pub struct MembershipView {
    pub org: Organization,
    pub membership: Membership,
}

impl OrgDao {
    pub fn new(db: &Database, code_retry_max: u32) -> Self {
        Self {
            base: BaseDao::new(db, Organization::COLLECTION),
            members: BaseDao::new(db, Membership::COLLECTION),
            notifications: BaseDao::new(db, Notification::COLLECTION),
            code_retry_max,
        }
    }

    /// Creates the organization and its founding admin membership, switching
    /// the caller's active org to the new one. Personal orgs are born with an
    /// invite code; business orgs get one lazily on first link request.
    pub async fn create(
        &self,
        user_id: ObjectId,
        name: String,
        kind: OrgKind,
        quota: &QuotaGuard,
    ) -> DaoResult<Organization> {
        let orgs = quota.check_org_limit(user_id).await?;
        if !orgs.allowed {
            return Err(DaoError::QuotaExceeded {
                scope: "organization",
                count: orgs.count,
                limit: orgs.limit,
            });
        }

        let org_id = self.insert_org(name, kind).await?;

        self.deactivate_all(user_id).await?;

        let now = DateTime::now();
        let membership = Membership {
            id: None,
            org_id,
            user_id,
            role: MemberRole::Admin,
            is_active: true,
            joined_at: now,
            updated_at: now,
        };
        self.members.insert_one(&membership).await?;

        self.base.find_by_id(org_id).await
    }

    /// Insert with a bounded retry on invite-code collision. Uniqueness is
    /// enforced by the sparse index, not by pre-checking.
    async fn insert_org(&self, name: String, kind: OrgKind) -> DaoResult<ObjectId> {
        let mut attempts = 0;
        loop {
            let now = DateTime::now();
            let invite_code = match kind {
                OrgKind::Personal => Some(generate_code(kind)),
                OrgKind::Business => None,
            };
            let org = Organization {
                id: None,
                name: name.clone(),
                kind,
                plan: Plan::Free,
                invite_code,
                reset_hour: 0,
                created_at: now,
                updated_at: now,
            };

            match self.base.insert_one(&org).await {
                Ok(id) => return Ok(id),
                Err(DaoError::DuplicateKey(_)) if attempts < self.code_retry_max => {
                    attempts += 1;
                    warn!(attempts, "Invite code collision on org insert, retrying");
                }
                Err(DaoError::DuplicateKey(_)) => return Err(DaoError::CodeGenerationFailed),
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn list_memberships(&self, user_id: ObjectId) -> DaoResult<Vec<MembershipView>> {
        let memberships = self
            .members
            .find_many(doc! { "user_id": user_id }, Some(doc! { "joined_at": 1 }))
            .await?;

        let org_ids: Vec<ObjectId> = memberships.iter().map(|m| m.org_id).collect();
        if org_ids.is_empty() {
            return Ok(Vec::new());
        }

        let orgs = self
            .base
            .find_many(doc! { "_id": { "$in": org_ids } }, None)
            .await?;

        let views = memberships
            .into_iter()
            .filter_map(|m| {
                orgs.iter()
                    .find(|o| o.id == Some(m.org_id))
                    .cloned()
                    .map(|org| MembershipView {
                        org,
                        membership: m,
                    })
            })
            .collect();

        Ok(views)
    }

    /// Deactivate-all then activate-one. Last committed write wins under
    /// concurrent switches; a duplicate-key from the partial index means a
    /// racing writer re-activated another membership between our two steps,
    /// so the sequence is retried once before surfacing.
    pub async fn switch_active(&self, user_id: ObjectId, org_id: ObjectId) -> DaoResult<()> {
        self.find_membership(org_id, user_id)
            .await?
            .ok_or(DaoError::NotAMember)?;

        let mut attempts = 0;
        loop {
            self.deactivate_all(user_id).await?;

            let activated = self
                .members
                .update_one(
                    doc! { "org_id": org_id, "user_id": user_id },
                    doc! { "$set": { "is_active": true, "updated_at": DateTime::now() } },
                )
                .await;

            match activated {
                Ok(true) => return Ok(()),
                // Membership deleted out from under us (leave/dissolve race).
                Ok(false) => return Err(DaoError::NotAMember),
                Err(DaoError::DuplicateKey(_)) if attempts < 1 => attempts += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Hardened contract: the sole admin cannot leave, only transfer or
    /// dissolve. The presence row is user-scoped and survives.
    pub async fn leave(&self, user_id: ObjectId, org_id: ObjectId) -> DaoResult<()> {
        let membership = self
            .find_membership(org_id, user_id)
            .await?
            .ok_or(DaoError::NotAMember)?;

        if membership.role == MemberRole::Admin && self.admin_count(org_id).await? <= 1 {
            return Err(DaoError::SoleAdmin);
        }

        self.members
            .delete_one(doc! { "org_id": org_id, "user_id": user_id })
            .await?;
        Ok(())
    }

    /// Two-step role swap modeled as a saga: demote the caller, promote the
    /// target, and re-promote the caller if the promotion fails so the org
    /// never ends up with zero admins. The compensating write's own failure
    /// is logged and the original error re-raised.
    pub async fn transfer_admin(
        &self,
        caller_id: ObjectId,
        org_id: ObjectId,
        new_admin_id: ObjectId,
    ) -> DaoResult<()> {
        let caller = self
            .find_membership(org_id, caller_id)
            .await?
            .ok_or(DaoError::NotAdmin)?;
        if caller.role != MemberRole::Admin {
            return Err(DaoError::NotAdmin);
        }

        self.find_membership(org_id, new_admin_id)
            .await?
            .ok_or(DaoError::NotAMember)?;

        if caller_id == new_admin_id {
            return Ok(());
        }

        self.set_role(org_id, caller_id, MemberRole::Member).await?;

        if let Err(promote_err) = self.set_role(org_id, new_admin_id, MemberRole::Admin).await {
            if let Err(rollback_err) =
                self.set_role(org_id, caller_id, MemberRole::Admin).await
            {
                error!(
                    %org_id,
                    error = %rollback_err,
                    "Admin transfer rollback failed; organization may need manual repair"
                );
            }
            return Err(promote_err);
        }

        Ok(())
    }

    /// Deletes the organization and everything scoped to it: memberships and
    /// notifications. The invite code dies with the org row.
    pub async fn dissolve(&self, admin_id: ObjectId, org_id: ObjectId) -> DaoResult<()> {
        self.require_admin(org_id, admin_id).await?;

        self.notifications
            .delete_many(doc! { "org_id": org_id })
            .await?;
        self.members.delete_many(doc! { "org_id": org_id }).await?;
        self.base.delete_one(doc! { "_id": org_id }).await?;
        Ok(())
    }

    pub async fn update_reset_hour(
        &self,
        admin_id: ObjectId,
        org_id: ObjectId,
        reset_hour: u8,
    ) -> DaoResult<()> {
        if reset_hour > 23 {
            return Err(DaoError::Validation(
                "reset_hour must be between 0 and 23".to_string(),
            ));
        }
        self.require_admin(org_id, admin_id).await?;

        self.base
            .update_by_id(
                org_id,
                doc! { "$set": { "reset_hour": reset_hour as i32, "updated_at": DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    pub async fn find_membership(
        &self,
        org_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<Membership>> {
        self.members
            .find_one(doc! { "org_id": org_id, "user_id": user_id })
            .await
    }

    pub async fn require_admin(&self, org_id: ObjectId, user_id: ObjectId) -> DaoResult<Membership> {
        let membership = self
            .find_membership(org_id, user_id)
            .await?
            .ok_or(DaoError::NotAdmin)?;
        if membership.role != MemberRole::Admin {
            return Err(DaoError::NotAdmin);
        }
        Ok(membership)
    }

    pub async fn active_membership(&self, user_id: ObjectId) -> DaoResult<Option<Membership>> {
        self.members
            .find_one(doc! { "user_id": user_id, "is_active": true })
            .await
    }

    pub async fn list_members(&self, org_id: ObjectId) -> DaoResult<Vec<Membership>> {
        self.members
            .find_many(doc! { "org_id": org_id }, Some(doc! { "joined_at": 1 }))
            .await
    }

    pub async fn admin_count(&self, org_id: ObjectId) -> DaoResult<u64> {
        self.members
            .count(doc! { "org_id": org_id, "role": "admin" })
            .await
    }

    pub async fn deactivate_all(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.members
            .update_many(
                doc! { "user_id": user_id, "is_active": true },
                doc! { "$set": { "is_active": false, "updated_at": DateTime::now() } },
            )
            .await
    }

    async fn set_role(
        &self,
        org_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<()> {
        let role = bson::to_bson(&role).map_err(bson::ser::Error::from)?;
        let matched = self
            .members
            .update_one(
                doc! { "org_id": org_id, "user_id": user_id },
                doc! { "$set": { "role": role, "updated_at": DateTime::now() } },
            )
            .await?;
        if !matched {
            return Err(DaoError::NotAMember);
        }
        Ok(())
    }
}
