use bson::{DateTime, doc, oid::ObjectId};
use doorsign_db::models::User;
use mongodb::Database;
use rand::prelude::IndexedRandom;

use super::base::{BaseDao, DaoError, DaoResult};

/// Avatar colors handed out round-robin-ish at signup; the picked color is
/// immutable and gets snapshotted into notification rows.
const AVATAR_COLORS: [&str; 8] = [
    "#E91E63", "#9C27B0", "#3F51B5", "#2196F3", "#009688", "#4CAF50", "#FF9800", "#795548",
];

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        display_name: String,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let avatar_color = AVATAR_COLORS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(AVATAR_COLORS[0])
            .to_string();
        let user = User {
            id: None,
            email,
            display_name,
            avatar_color,
            password_hash: Some(password_hash),
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn update_display_name(
        &self,
        user_id: ObjectId,
        display_name: String,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! {
                    "$set": {
                        "display_name": display_name,
                        "updated_at": DateTime::now(),
                    }
                },
            )
            .await
    }

    pub async fn update_password_hash(
        &self,
        user_id: ObjectId,
        password_hash: String,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! {
                    "$set": {
                        "password_hash": password_hash,
                        "updated_at": DateTime::now(),
                    }
                },
            )
            .await
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(
                doc! { "_id": { "$in": ids.to_vec() } },
                Some(doc! { "display_name": 1 }),
            )
            .await
    }
}
