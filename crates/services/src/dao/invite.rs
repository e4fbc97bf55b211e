use bson::{DateTime, doc, oid::ObjectId};
use doorsign_db::models::{MemberRole, Membership, OrgKind, Organization};
use mongodb::Database;
use tracing::warn;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::quota::QuotaGuard;

/// 32 symbols; drops glyphs that read ambiguously when shared over a
/// shoulder or a whiteboard (0/O, 1/I).
const PERSONAL_ALPHABET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const PERSONAL_CODE_LEN: usize = 8;

const BUSINESS_ALPHABET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BUSINESS_TOKEN_LEN: usize = 16;

/// Personal orgs get a short human-relayable code; business orgs a long
/// link token.
pub fn generate_code(kind: OrgKind) -> String {
    let (alphabet, len) = match kind {
        OrgKind::Personal => (PERSONAL_ALPHABET, PERSONAL_CODE_LEN),
        OrgKind::Business => (BUSINESS_ALPHABET, BUSINESS_TOKEN_LEN),
    };
    let chars: Vec<char> = alphabet.chars().collect();
    nanoid::nanoid!(len, &chars)
}

pub struct InviteDao {
    orgs: BaseDao<Organization>,
    members: BaseDao<Membership>,
    code_retry_max: u32,
}

#[derive(Debug, Clone)]
pub struct InviteLink {
    pub code: String,
    pub url: String,
}

impl InviteDao {
    pub fn new(db: &Database, code_retry_max: u32) -> Self {
        Self {
            orgs: BaseDao::new(db, Organization::COLLECTION),
            members: BaseDao::new(db, Membership::COLLECTION),
            code_retry_max,
        }
    }

    /// Returns the org's invite link, generating the code lazily if the org
    /// does not carry one yet. Admin-only.
    pub async fn get_or_create_link(
        &self,
        caller_id: ObjectId,
        org_id: ObjectId,
        base_url: &str,
    ) -> DaoResult<InviteLink> {
        let org = self.orgs.find_by_id(org_id).await?;

        let membership = self
            .members
            .find_one(doc! { "org_id": org_id, "user_id": caller_id })
            .await?
            .ok_or(DaoError::NotAdmin)?;
        if membership.role != MemberRole::Admin {
            return Err(DaoError::NotAdmin);
        }

        let code = match org.invite_code {
            Some(code) => code,
            None => self.assign_code(org_id, org.kind).await?,
        };

        Ok(InviteLink {
            url: format!("{}/invite/{}", base_url.trim_end_matches('/'), code),
            code,
        })
    }

    /// Writes a fresh code onto the org. A collision with another org's code
    /// trips the sparse unique index and is retried with a new code; a
    /// concurrent admin winning the race is detected by the filter matching
    /// nothing, in which case the winner's code is returned.
    async fn assign_code(&self, org_id: ObjectId, kind: OrgKind) -> DaoResult<String> {
        let mut attempts = 0;
        loop {
            let code = generate_code(kind);
            let result = self
                .orgs
                .update_one(
                    doc! { "_id": org_id, "invite_code": null },
                    doc! { "$set": { "invite_code": code.clone(), "updated_at": DateTime::now() } },
                )
                .await;

            match result {
                Ok(true) => return Ok(code),
                Ok(false) => {
                    let org = self.orgs.find_by_id(org_id).await?;
                    return org.invite_code.ok_or(DaoError::CodeGenerationFailed);
                }
                Err(DaoError::DuplicateKey(_)) if attempts < self.code_retry_max => {
                    attempts += 1;
                    warn!(%org_id, attempts, "Invite code collision, retrying");
                }
                Err(DaoError::DuplicateKey(_)) => return Err(DaoError::CodeGenerationFailed),
                Err(e) => return Err(e),
            }
        }
    }

    /// Redeems a code into an active `member` membership. Not idempotent
    /// under double-submit: two redemptions can both pass the member check,
    /// and the (org_id, user_id) unique index is the actual safety net — the
    /// second insert's duplicate-key failure is mapped to `AlreadyMember`.
    pub async fn redeem(
        &self,
        user_id: ObjectId,
        code: &str,
        quota: &QuotaGuard,
    ) -> DaoResult<Organization> {
        let org = self
            .orgs
            .find_one(doc! { "invite_code": code })
            .await?
            .ok_or(DaoError::InvalidCode)?;
        let org_id = org.id.ok_or(DaoError::NotFound)?;

        let existing = self
            .members
            .find_one(doc! { "org_id": org_id, "user_id": user_id })
            .await?;
        if existing.is_some() {
            return Err(DaoError::AlreadyMember);
        }

        let seats = quota.check_member_limit(org_id).await?;
        if !seats.allowed {
            return Err(DaoError::QuotaExceeded {
                scope: "member",
                count: seats.count,
                limit: seats.limit,
            });
        }
        let orgs = quota.check_org_limit(user_id).await?;
        if !orgs.allowed {
            return Err(DaoError::QuotaExceeded {
                scope: "organization",
                count: orgs.count,
                limit: orgs.limit,
            });
        }

        self.members
            .update_many(
                doc! { "user_id": user_id, "is_active": true },
                doc! { "$set": { "is_active": false, "updated_at": DateTime::now() } },
            )
            .await?;

        let now = DateTime::now();
        let membership = Membership {
            id: None,
            org_id,
            user_id,
            role: MemberRole::Member,
            is_active: true,
            joined_at: now,
            updated_at: now,
        };
        match self.members.insert_one(&membership).await {
            Ok(_) => Ok(org),
            Err(DaoError::DuplicateKey(_)) => Err(DaoError::AlreadyMember),
            Err(e) => Err(e),
        }
    }
}
