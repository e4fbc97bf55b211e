use bson::{DateTime, doc, oid::ObjectId};
use doorsign_db::models::{
    Membership, Notification, NotificationKind, NotificationStatus, User,
};
use mongodb::Database;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Accepted,
    Declined,
}

impl ReplyOutcome {
    fn to_status(self) -> NotificationStatus {
        match self {
            ReplyOutcome::Accepted => NotificationStatus::Accepted,
            ReplyOutcome::Declined => NotificationStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastReceipt {
    pub recipients: u64,
    pub delivered: u64,
}

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
    members: BaseDao<Membership>,
    users: BaseDao<User>,
    ttl_hours: i64,
}

impl NotificationDao {
    pub fn new(db: &Database, ttl_hours: i64) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
            members: BaseDao::new(db, Membership::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
            ttl_hours,
        }
    }

    /// Fan-out to every other member currently active in the sender's active
    /// org. N independent inserts, not a transaction: failures are counted
    /// per row and surfaced as `PartialFailure` instead of being dropped.
    pub async fn broadcast(
        &self,
        sender_id: ObjectId,
        kind: NotificationKind,
        message: String,
    ) -> DaoResult<BroadcastReceipt> {
        let active = self
            .members
            .find_one(doc! { "user_id": sender_id, "is_active": true })
            .await?
            .ok_or(DaoError::NotAMember)?;
        let org_id = active.org_id;

        let sender = self.users.find_by_id(sender_id).await?;

        let recipients = self
            .members
            .find_many(
                doc! {
                    "org_id": org_id,
                    "is_active": true,
                    "user_id": { "$ne": sender_id },
                },
                None,
            )
            .await?;

        let now = DateTime::now();
        let expires_at = DateTime::from_millis(
            now.timestamp_millis() + self.ttl_hours * 60 * 60 * 1000,
        );

        let mut delivered: u64 = 0;
        let mut failed: u64 = 0;
        for recipient in &recipients {
            let notification = Notification {
                id: None,
                org_id,
                sender_id,
                sender_name: sender.display_name.clone(),
                sender_avatar_color: sender.avatar_color.clone(),
                recipient_id: recipient.user_id,
                kind,
                message: message.clone(),
                status: NotificationStatus::Pending,
                is_read: false,
                created_at: now,
                expires_at,
            };
            match self.base.insert_one(&notification).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    error!(recipient = %recipient.user_id, error = %e, "Broadcast insert failed");
                }
            }
        }

        if failed > 0 {
            return Err(DaoError::PartialFailure { delivered, failed });
        }

        Ok(BroadcastReceipt {
            recipients: recipients.len() as u64,
            delivered,
        })
    }

    /// The pending precondition rides in the update filter, so two racing
    /// replies resolve to one winner; the loser is told `AlreadyReplied`.
    pub async fn reply(
        &self,
        recipient_id: ObjectId,
        notification_id: ObjectId,
        outcome: ReplyOutcome,
    ) -> DaoResult<Notification> {
        let owned = doc! { "_id": notification_id, "recipient_id": recipient_id };

        let notification = self
            .base
            .find_one(owned.clone())
            .await?
            .ok_or(DaoError::NotFound)?;

        let now = DateTime::now();
        if notification.is_expired(now) {
            return Err(DaoError::Expired);
        }

        let status =
            bson::to_bson(&outcome.to_status()).map_err(bson::ser::Error::from)?;
        let updated = self
            .base
            .find_one_and_update(
                doc! {
                    "_id": notification_id,
                    "recipient_id": recipient_id,
                    "status": "pending",
                    "expires_at": { "$gte": now },
                },
                doc! { "$set": { "status": status, "is_read": true } },
            )
            .await?;

        match updated {
            Some(n) => Ok(n),
            None => {
                // Lost a race: either a concurrent reply won or expiry passed
                // between the check and the update.
                let current = self.base.find_one(owned).await?.ok_or(DaoError::NotFound)?;
                if current.status != NotificationStatus::Pending {
                    Err(DaoError::AlreadyReplied)
                } else {
                    Err(DaoError::Expired)
                }
            }
        }
    }

    /// Actionable inbox: pending and not past expiry. Expired-but-unreplied
    /// rows stay out of this list but remain in history.
    pub async fn list_pending(&self, recipient_id: ObjectId) -> DaoResult<Vec<Notification>> {
        self.base
            .find_many(
                doc! {
                    "recipient_id": recipient_id,
                    "status": "pending",
                    "expires_at": { "$gte": DateTime::now() },
                },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    pub async fn list_history(
        &self,
        recipient_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        self.base
            .find_paginated(
                doc! { "recipient_id": recipient_id },
                Some(doc! { "created_at": -1 }),
                params,
            )
            .await
    }

    pub async fn mark_read(
        &self,
        recipient_id: ObjectId,
        notification_id: ObjectId,
    ) -> DaoResult<()> {
        let matched = self
            .base
            .update_one(
                doc! { "_id": notification_id, "recipient_id": recipient_id },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        if !matched {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }
}
