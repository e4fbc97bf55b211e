use bson::{DateTime, doc, oid::ObjectId};
use doorsign_db::models::{CustomSlot, PresenceStatus, StatusTag};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

#[derive(Debug, Clone, Copy)]
pub enum CustomSlotId {
    One,
    Two,
}

pub struct PresenceDao {
    pub base: BaseDao<PresenceStatus>,
}

impl PresenceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, PresenceStatus::COLLECTION),
        }
    }

    /// Seeds the user's status row; a no-op if one already exists. Called
    /// alongside the user's first membership.
    pub async fn ensure(&self, user_id: ObjectId) -> DaoResult<()> {
        let defaults = PresenceStatus {
            id: None,
            user_id,
            status: StatusTag::default(),
            custom1: CustomSlot::default(),
            custom2: CustomSlot::default(),
            updated_at: DateTime::now(),
        };
        let defaults = bson::to_document(&defaults)?;
        self.base
            .upsert_one(
                doc! { "user_id": user_id },
                doc! { "$setOnInsert": defaults },
            )
            .await
    }

    pub async fn set_status(&self, user_id: ObjectId, status: StatusTag) -> DaoResult<()> {
        let status = bson::to_bson(&status).map_err(bson::ser::Error::from)?;
        let matched = self
            .base
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$set": { "status": status, "updated_at": DateTime::now() } },
            )
            .await?;
        if !matched {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }

    /// Overwrites one custom slot's label/icon without touching the current
    /// status tag.
    pub async fn set_custom_slot(
        &self,
        user_id: ObjectId,
        slot: CustomSlotId,
        label: String,
        icon: String,
    ) -> DaoResult<()> {
        let slot_doc = bson::to_bson(&CustomSlot { label, icon }).map_err(bson::ser::Error::from)?;
        let update = match slot {
            CustomSlotId::One => {
                doc! { "$set": { "custom1": slot_doc, "updated_at": DateTime::now() } }
            }
            CustomSlotId::Two => {
                doc! { "$set": { "custom2": slot_doc, "updated_at": DateTime::now() } }
            }
        };
        let matched = self
            .base
            .update_one(doc! { "user_id": user_id }, update)
            .await?;
        if !matched {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }

    pub async fn get(&self, user_id: ObjectId) -> DaoResult<PresenceStatus> {
        self.base
            .find_one(doc! { "user_id": user_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn for_users(&self, user_ids: &[ObjectId]) -> DaoResult<Vec<PresenceStatus>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "user_id": { "$in": user_ids.to_vec() } }, None)
            .await
    }
}
